//! Section tree reconstruction from heading tags.
//!
//! Archive documents use heading levels loosely: the top level may be `h3`
//! in one work and `h4` in another, and levels are sometimes skipped. The
//! builder infers a logical hierarchy from the run of headings and stores it
//! in an arena, with links between sections held as ids.

use crate::error::Result;
use crate::node::text_content;
use crate::options::AnchorScheme;
use crate::token::Token;

// ============================================================================
// Types
// ============================================================================

/// Index of a section within its [`SectionTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionId(pub u32);

impl SectionId {
    /// The synthetic document root (always 0).
    pub const ROOT: SectionId = SectionId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One logical section of the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Anchor id of the heading (or body, for the root).
    pub id: String,
    /// Heading text without ruby readings.
    pub title: String,
    /// Logical depth: 1 for the root, 2 for top-level sections.
    pub level: u8,
    /// Level of the heading tag, for sections that have one.
    pub heading_level: Option<u8>,
    /// Body index of the heading's start tag.
    pub heading: Option<usize>,
    /// First body index covered, inclusive of the heading.
    pub start: usize,
    /// Last body index before the next section at the same or a shallower
    /// level.
    pub end: usize,
    /// Last body index before the next section of any level, i.e. the end
    /// of this section's own content ahead of its first subsection.
    pub content_end: usize,
    pub parent: Option<SectionId>,
    pub first_child: Option<SectionId>,
    pub last_child: Option<SectionId>,
    pub prev_sibling: Option<SectionId>,
    pub next_sibling: Option<SectionId>,
}

impl Section {
    fn new(id: String, title: String, level: u8, start: usize, end: usize) -> Self {
        Self {
            id,
            title,
            level,
            heading_level: None,
            heading: None,
            start,
            end,
            content_end: end,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Sections of one document, rooted at a synthetic level-1 section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTree {
    sections: Vec<Section>,
}

/// Table-of-contents entry for renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct TocEntry {
    pub title: String,
    pub anchor: String,
    pub level: u8,
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Vec::is_empty"))]
    pub children: Vec<TocEntry>,
}

impl SectionTree {
    pub fn root(&self) -> &Section {
        &self.sections[0]
    }

    pub fn get(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(id.index())
    }

    /// Children of `id` in document order.
    pub fn children(&self, id: SectionId) -> Children<'_> {
        Children {
            tree: self,
            current: self.get(id).and_then(|s| s.first_child),
        }
    }

    /// Sections directly under the root.
    pub fn top_level(&self) -> Children<'_> {
        self.children(SectionId::ROOT)
    }

    /// All sections, root first, then in order of creation (document order).
    pub fn iter(&self) -> impl Iterator<Item = (SectionId, &Section)> {
        self.sections
            .iter()
            .enumerate()
            .map(|(i, s)| (SectionId(i as u32), s))
    }

    /// Number of sections, not counting the root.
    pub fn section_count(&self) -> usize {
        self.sections.len() - 1
    }

    /// Nested TOC entries. The root takes `fallback_title` when it has no
    /// title of its own.
    pub fn to_toc(&self, fallback_title: &str) -> TocEntry {
        let mut entry = self.toc_entry(SectionId::ROOT);
        if entry.title.is_empty() {
            entry.title = fallback_title.to_string();
        }
        entry
    }

    fn toc_entry(&self, id: SectionId) -> TocEntry {
        let section = &self.sections[id.index()];
        TocEntry {
            title: section.title.clone(),
            anchor: section.id.clone(),
            level: section.level,
            children: self.children(id).map(|(child, _)| self.toc_entry(child)).collect(),
        }
    }

    fn push(&mut self, mut section: Section, parent: SectionId) -> SectionId {
        let id = SectionId(self.sections.len() as u32);
        section.parent = Some(parent);
        section.prev_sibling = self.sections[parent.index()].last_child;
        self.sections.push(section);

        if let Some(prev) = self.sections[id.index()].prev_sibling {
            self.sections[prev.index()].next_sibling = Some(id);
        }
        let parent = &mut self.sections[parent.index()];
        if parent.first_child.is_none() {
            parent.first_child = Some(id);
        }
        parent.last_child = Some(id);
        id
    }

    /// The ancestor `generations` steps up from `id`, stopping at the root.
    fn ancestor(&self, id: SectionId, generations: usize) -> SectionId {
        let mut current = id;
        for _ in 0..generations {
            match self.sections[current.index()].parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current
    }
}

/// Iterator over the children of a section.
pub struct Children<'a> {
    tree: &'a SectionTree,
    current: Option<SectionId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = (SectionId, &'a Section);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let section = self.tree.get(id)?;
        self.current = section.next_sibling;
        Some((id, section))
    }
}

// ============================================================================
// Building
// ============================================================================

/// Give every heading (and the body itself) an anchor id.
///
/// Headings that already carry an id keep it; the rest are numbered by a
/// counter local to this call. The first token (`<body>`) gets the root
/// anchor when it has no id.
pub fn assign_anchors(body: &mut [Token], scheme: &AnchorScheme) {
    let mut counter = scheme.counter();
    for token in body.iter_mut() {
        if token.heading_level().is_some() && token.id().is_none() {
            token.attrs.set("id", counter.next_anchor());
        }
    }

    if let Some(first) = body.first_mut()
        && first.id().is_none()
    {
        first.attrs.set("id", scheme.root_anchor());
    }
}

/// Assign anchors and build the section tree of a rewritten body.
///
/// Fails only if a heading is never closed.
pub fn build_sections(body: &mut [Token], scheme: &AnchorScheme) -> Result<SectionTree> {
    assign_anchors(body, scheme);
    let body: &[Token] = body;

    let last = body.len().saturating_sub(1);
    let root_id = body
        .first()
        .and_then(Token::id)
        .map(str::to_string)
        .unwrap_or_else(|| scheme.root_anchor());

    let mut tree = SectionTree {
        sections: vec![Section::new(root_id.clone(), String::new(), 1, 0, last)],
    };

    let headings: Vec<(usize, u8)> = body
        .iter()
        .enumerate()
        .filter_map(|(i, t)| t.heading_level().map(|level| (i, level)))
        .collect();

    let Some(top) = headings.iter().map(|&(_, level)| level).min() else {
        log::debug!("No headings; section tree is the root only");
        return Ok(tree);
    };

    // Heading-tag level each section is compared by. The root sits one above
    // the shallowest heading.
    let mut nominal = vec![top - 1];
    let mut cursor = SectionId::ROOT;

    let (first_index, first_level) = headings[0];
    if first_level != top {
        let title = text_content(body, first_index)?.trim().to_string();
        let wrapper = Section::new(root_id, title, 2, 0, last);
        cursor = tree.push(wrapper, SectionId::ROOT);
        nominal.push(top);
        log::debug!("First heading is h{first_level}, not h{top}; added a wrapper section");
    }

    for (start, level) in headings {
        let current = nominal[cursor.index()];
        let parent = if level == current + 1 {
            cursor
        } else if level + 1 == current {
            tree.ancestor(cursor, 2)
        } else if level + 2 == current {
            tree.ancestor(cursor, 3)
        } else {
            tree.ancestor(cursor, 1)
        };

        // Everything still open below the new parent ends here.
        let end = start.saturating_sub(1);
        let mut open = cursor;
        while open != parent {
            tree.sections[open.index()].end = end;
            match tree.sections[open.index()].parent {
                Some(p) => open = p,
                None => break,
            }
        }
        tree.sections[cursor.index()].content_end = end;

        let title = text_content(body, start)?.trim().to_string();
        let id = body[start].id().unwrap_or_default().to_string();
        let depth = tree.sections[parent.index()].level + 1;

        let mut section = Section::new(id, title, depth, start, last);
        section.heading = Some(start);
        section.heading_level = Some(level);

        log::info!("Found section: {} (level {depth})", section.title);
        cursor = tree.push(section, parent);
        nominal.push(level);
    }

    Ok(tree)
}
