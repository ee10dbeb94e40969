//! Google Drive upload: OAuth2 refresh-token handling and the Drive v2 REST
//! calls needed to drop a scan round into a fresh folder.

mod client;
mod oauth;
mod uploader;

pub use client::{DriveClient, DriveFile, FileMetadata, ParentReference, DRIVE_API_BASE, FOLDER_MIME_TYPE};
pub use oauth::{OAuthApp, TokenResponse, TokenSource, AUTH_URL, DRIVE_SCOPE, OOB_REDIRECT, TOKEN_URL};
pub use uploader::DriveUploader;
