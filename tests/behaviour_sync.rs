//! Behaviour tests for mirror synchronization.
//!
//! These scenarios validate the mirror invariant over a complete plugin
//! fixture: after a run the destination holds byte-identical copies of
//! every include entry and nothing else.

mod support;

use bindery::config::INCLUDE;
use bindery::error::BinderyError;
use bindery::sync::Synchronizer;
use std::fs;

#[test]
fn a_sync_run_mirrors_every_include_entry() {
    let (_project, root) = support::plugin_project("reporter");
    let (_scratch, scratch) = support::scratch_dir();
    let dest = scratch.join("reporter");

    Synchronizer::new(&root, INCLUDE)
        .sync_to(&dest)
        .expect("sync succeeds");

    for file in [
        "package.json",
        "LICENSE",
        "README.md",
        "index.js",
        "init.js",
        "postinst.js",
        "server/routes/api.js",
        "lib/util.js",
        "public/app.js",
    ] {
        assert_eq!(
            fs::read(root.join(file)).expect("read source"),
            fs::read(dest.join(file)).expect("read destination"),
            "{file} must be byte-identical in the destination"
        );
    }
    assert!(dest.join("phantomjs").is_dir());
}

#[test]
fn destination_only_entries_are_deleted() {
    let (_project, root) = support::plugin_project("reporter");
    let (_scratch, scratch) = support::scratch_dir();
    let dest = scratch.join("reporter");

    fs::create_dir_all(dest.join("server/stale")).expect("mkdir stale");
    fs::write(dest.join("server/stale/old.js"), "stale").expect("write stale file");
    fs::write(dest.join("rogue.txt"), "stray").expect("write stray file");

    Synchronizer::new(&root, INCLUDE)
        .sync_to(&dest)
        .expect("sync succeeds");

    assert!(!dest.join("server/stale").exists());
    assert!(!dest.join("rogue.txt").exists());
    assert!(dest.join("server/routes/api.js").is_file());
}

#[test]
fn a_resync_propagates_source_deletions() {
    let (_project, root) = support::plugin_project("reporter");
    let (_scratch, scratch) = support::scratch_dir();
    let dest = scratch.join("reporter");
    let synchronizer = Synchronizer::new(&root, INCLUDE);

    synchronizer.sync_to(&dest).expect("first sync succeeds");
    assert!(dest.join("lib/util.js").is_file());

    fs::remove_file(root.join("lib/util.js")).expect("delete source file");
    fs::write(root.join("lib/helper.js"), "export {};\n").expect("write new source file");

    synchronizer.sync_to(&dest).expect("second sync succeeds");
    assert!(!dest.join("lib/util.js").exists());
    assert!(dest.join("lib/helper.js").is_file());
}

#[test]
fn a_missing_include_entry_fails_the_whole_run() {
    let (_project, root) = support::plugin_project("reporter");
    let (_scratch, scratch) = support::scratch_dir();
    let dest = scratch.join("reporter");

    fs::remove_file(root.join("postinst.js")).expect("remove an include entry");

    let err = Synchronizer::new(&root, INCLUDE)
        .sync_to(&dest)
        .expect_err("sync must fail");
    assert!(matches!(
        err,
        BinderyError::MissingSource { ref entry, .. } if entry == "postinst.js"
    ));
}
