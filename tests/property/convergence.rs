// tests/property/convergence.rs

use std::collections::BTreeMap;

use proptest::prelude::*;

use mirrorsync::replicate::copy_missing;

use crate::common::{MirrorFixture, diff_roots};

/// What to put at a relative path on one side.
#[derive(Debug, Clone)]
enum Entry {
    File(Vec<u8>),
    Dir,
}

fn entry() -> impl Strategy<Value = Entry> {
    prop_oneof![
        3 => prop::collection::vec(any::<u8>(), 0..64).prop_map(Entry::File),
        1 => Just(Entry::Dir),
    ]
}

/// Paths from a small alphabet so source and target overlap often.
fn rel_path() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(vec!["a", "b", "c.txt", "d.bin"]), 1..4)
        .prop_map(|parts| parts.join("/"))
}

fn layout() -> impl Strategy<Value = BTreeMap<String, Entry>> {
    prop::collection::btree_map(rel_path(), entry(), 0..12)
}

/// Materialize `layout` under a root, skipping entries that collide with
/// an already created entry of the other kind.
fn populate(root: &std::path::Path, layout: &BTreeMap<String, Entry>) {
    for (rel, entry) in layout {
        let path = root.join(rel);
        let parent_ok = path
            .ancestors()
            .skip(1)
            .take_while(|p| *p != root)
            .all(|p| !p.is_file());
        if !parent_ok || path.exists() {
            continue;
        }
        match entry {
            Entry::Dir => {
                let _ = std::fs::create_dir_all(&path);
            }
            Entry::File(bytes) => {
                if let Some(parent) = path.parent() {
                    if std::fs::create_dir_all(parent).is_err() {
                        continue;
                    }
                }
                let _ = std::fs::write(&path, bytes);
            }
        }
    }
}

/// A source file sitting where the target holds a non-empty directory.
/// Such directories are never wiped, so that pair cannot converge.
fn file_shadows_populated_dir(fx: &MirrorFixture) -> bool {
    fx.source_entries()
        .iter()
        .filter(|rel| !rel.ends_with('/'))
        .any(|rel| {
            std::fs::read_dir(fx.target().join(rel))
                .map(|mut entries| entries.next().is_some())
                .unwrap_or(false)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn copying_the_diff_converges(source in layout(), target in layout()) {
        let fx = MirrorFixture::new();
        populate(fx.source(), &source);
        populate(fx.target(), &target);
        prop_assume!(!file_shadows_populated_dir(&fx));

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let remaining = rt.block_on(async {
            let ctx = fx.context();
            let (src, dst, missing) = diff_roots(&ctx).await;
            let report = copy_missing(&ctx, &src, &dst, &missing).await;
            prop_assert_eq!(report.failures, 0);
            prop_assert_eq!(report.refused, 0);

            let (_, _, again) = diff_roots(&ctx).await;
            Ok::<_, TestCaseError>(again)
        })?;

        prop_assert!(remaining.is_empty(), "still missing: {:?}", remaining);

        // Every source entry now exists in the target with the same kind.
        let target_entries = fx.target_entries();
        for entry in fx.source_entries() {
            prop_assert!(target_entries.contains(&entry), "{} not mirrored", entry);
        }
    }
}
