//! Shared setup for tests.

use ember_source::fixtures::BundleBuilder;
use ember_source::{Bundle, SourceOptions};
use tempfile::TempDir;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Store {
    Archive,
    Directory,
}

pub(crate) async fn open(store: Store, builder: &BundleBuilder) -> (TempDir, Bundle) {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = match store {
        Store::Archive => builder.write_archive(temp_dir.path().join("gateway.gwbk")).await.unwrap(),
        Store::Directory => builder.write_directory(temp_dir.path().join("gateway")).await.unwrap(),
    };
    let options = SourceOptions {
        temp_dir: Some(temp_dir.path().to_path_buf()),
        ..SourceOptions::default()
    };
    let bundle = Bundle::open(&path, &options).await.unwrap();
    (temp_dir, bundle)
}
