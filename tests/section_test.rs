//! Section tree tests over tokenized bodies.

use aozora_normalize::section::build_sections;
use aozora_normalize::token::tokenize;
use aozora_normalize::{AnchorScheme, SectionId, SectionTree};

fn tree_for(levels: &[u8]) -> SectionTree {
    let mut source = String::from("<body>");
    for (i, level) in levels.iter().enumerate() {
        source.push_str(&format!("<h{level}>s{i}</h{level}><p>本文</p>"));
    }
    source.push_str("</body>");

    let mut tokens = tokenize(&source).expect("tokenize");
    build_sections(&mut tokens, &AnchorScheme::default()).expect("build sections")
}

/// Render the tree as `title(children...)` for compact assertions.
fn shape(tree: &SectionTree, id: SectionId) -> String {
    tree.children(id)
        .map(|(child, section)| {
            let inner = shape(tree, child);
            if inner.is_empty() {
                section.title.clone()
            } else {
                format!("{}({})", section.title, inner)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn test_levels_two_three_three_two_three() {
    let tree = tree_for(&[2, 3, 3, 2, 3]);
    assert_eq!(shape(&tree, SectionId::ROOT), "s0(s1 s2) s3(s4)");
}

#[test]
fn test_logical_levels_follow_parents() {
    let tree = tree_for(&[3, 5, 5, 3]);
    for (_, section) in tree.iter().skip(1) {
        let parent = section.parent.and_then(|p| tree.get(p)).expect("parent");
        assert_eq!(section.level, parent.level + 1);
    }
}

#[test]
fn test_skipped_level_becomes_sibling() {
    // h3 -> h5 is neither a child nor a recognised jump back, so s1 lands
    // beside s0; h4 is then one above h5 and climbs past the root.
    let tree = tree_for(&[3, 5, 4]);
    assert_eq!(shape(&tree, SectionId::ROOT), "s0 s1 s2");
}

#[test]
fn test_three_level_jump_back_flattens() {
    let tree = tree_for(&[3, 4, 5, 6, 3]);
    assert_eq!(shape(&tree, SectionId::ROOT), "s0(s1(s2(s3 s4)))");
}

#[test]
fn test_deeper_first_heading_gets_wrapper() {
    let tree = tree_for(&[4, 3, 4]);
    assert_eq!(shape(&tree, SectionId::ROOT), "s0(s0) s1(s2)");
    let wrapper = tree.top_level().next().expect("wrapper").1;
    assert_eq!(wrapper.heading, None);
    assert_eq!(wrapper.start, 0);
}

#[test]
fn test_sibling_links() {
    let tree = tree_for(&[3, 3, 3]);
    let ids: Vec<SectionId> = tree.top_level().map(|(id, _)| id).collect();
    assert_eq!(ids.len(), 3);

    let middle = tree.get(ids[1]).expect("middle");
    assert_eq!(middle.prev_sibling, Some(ids[0]));
    assert_eq!(middle.next_sibling, Some(ids[2]));
    assert_eq!(tree.root().first_child, Some(ids[0]));
    assert_eq!(tree.root().last_child, Some(ids[2]));
}

#[test]
fn test_end_covers_until_next_peer() {
    let tree = tree_for(&[3, 4, 3]);
    let top: Vec<_> = tree.top_level().map(|(_, s)| s.clone()).collect();
    let child = tree.children(SectionId(1)).next().expect("child").1;

    assert_eq!(top[0].end, top[1].start - 1);
    assert_eq!(child.end, top[1].start - 1);
    assert_eq!(top[0].content_end, child.start - 1);
    assert_eq!(top[1].end, tree.root().end);
}
