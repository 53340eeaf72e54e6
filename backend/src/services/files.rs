//! Static file routes: stored photographs and the intake front-end.

use super::submit::upload::UPLOADS_PATH;
use actix_files::Files;
use std::path::Path;

/// `GET /uploads/{filename}` for photographs saved by the submission route.
pub fn uploads_service(dir: &Path) -> Files {
    Files::new(UPLOADS_PATH, dir)
}

/// Front-end assets, with `index.html` served at `/`. Register this last: it matches
/// every path.
pub fn public_service(dir: &Path) -> Files {
    Files::new("/", dir).index_file("index.html")
}
