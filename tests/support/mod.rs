//! Shared fixtures for the behaviour suites.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// Create a complete plugin project containing every include entry.
///
/// Returns the guard keeping the directory alive and the UTF-8 project
/// root.
pub fn plugin_project(name: &str) -> (TempDir, Utf8PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp dir");

    fs::write(
        root.join("package.json"),
        format!(
            concat!(
                "{{\n",
                "  \"name\": \"{name}\",\n",
                "  \"version\": \"0.3.1\",\n",
                "  \"kibana\": {{\n",
                "    \"version\": \"1.0.0\"\n",
                "  }}\n",
                "}}"
            ),
            name = name
        ),
    )
    .expect("write package.json");
    fs::write(root.join("LICENSE"), "ISC\n").expect("write LICENSE");
    fs::write(root.join("README.md"), "# plugin\n").expect("write README.md");
    fs::write(root.join("index.js"), "module.exports = {};\n").expect("write index.js");
    fs::write(root.join("init.js"), "module.exports = function init() {};\n")
        .expect("write init.js");
    fs::write(root.join("postinst.js"), "process.exit(0);\n").expect("write postinst.js");

    fs::create_dir_all(root.join("server/routes")).expect("mkdir server");
    fs::write(root.join("server/routes/api.js"), "export const routes = [];\n")
        .expect("write api.js");
    fs::create_dir_all(root.join("lib")).expect("mkdir lib");
    fs::write(root.join("lib/util.js"), "export const noop = () => {};\n")
        .expect("write util.js");
    fs::create_dir_all(root.join("public")).expect("mkdir public");
    fs::write(root.join("public/app.js"), "export const app = {};\n").expect("write app.js");
    fs::create_dir_all(root.join("phantomjs")).expect("mkdir phantomjs");

    (dir, root)
}

/// A second temporary directory as a UTF-8 path, for destinations.
pub fn scratch_dir() -> (TempDir, Utf8PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp dir");
    (dir, path)
}

/// Entry names in a zip archive, sorted.
pub fn zip_entry_names(path: &Utf8Path) -> Vec<String> {
    let file = fs::File::open(path).expect("open archive");
    let mut archive = zip::ZipArchive::new(file).expect("read archive");
    let mut names: Vec<String> = (0..archive.len())
        .map(|index| archive.by_index(index).expect("archive entry").name().to_owned())
        .collect();
    names.sort();
    names
}
