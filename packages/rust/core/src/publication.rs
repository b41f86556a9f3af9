//! Publication-metadata blocks: lookup, year extraction, dedup, replacement.
//!
//! Blocks are the `PubInfo` and legacy `Lieferung` children of the
//! `Lexikonartikel` element.

use std::sync::LazyLock;

use harmonizer_markup::Element;
use harmonizer_shared::vocab::tags;
use harmonizer_shared::{HarmonizerError, Result, VariantKind};
use regex::Regex;

pub fn is_publication_block(el: &Element) -> bool {
    el.name == tags::PUB_INFO || el.name == tags::DELIVERY
}

/// Publication blocks of a record, in document order.
pub fn publication_blocks(root: &Element) -> Vec<&Element> {
    root.child(tags::ARTICLE)
        .map(|article| {
            article
                .children
                .iter()
                .filter(|c| is_publication_block(c))
                .collect()
        })
        .unwrap_or_default()
}

/// Largest four-digit year in the block's text, or 0 when there is none.
pub fn block_year(block: &Element) -> u32 {
    static YEAR_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\b(\d{4})\b").expect("valid regex"));

    YEAR_RE
        .captures_iter(&block.text_content())
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .max()
        .unwrap_or(0)
}

/// Channel named by the first publication block, if any.
pub fn classify(root: &Element) -> Option<VariantKind> {
    publication_blocks(root)
        .first()
        .map(|block| VariantKind::from_block_text(&block.text_content()))
}

/// Keep only the most recent publication block and retag it `PubInfo`.
///
/// Ties keep the earlier block. Returns `false` when the article has no block.
pub fn keep_latest_block(article: &mut Element) -> bool {
    let mut latest: Option<(usize, u32)> = None;
    for (i, child) in article.children.iter().enumerate() {
        if !is_publication_block(child) {
            continue;
        }
        let year = block_year(child);
        if latest.is_none_or(|(_, best)| year > best) {
            latest = Some((i, year));
        }
    }
    let Some((keep, _)) = latest else {
        return false;
    };

    let mut index = 0;
    article.children.retain(|c| {
        let retain = index == keep || !is_publication_block(c);
        index += 1;
        retain
    });
    for child in &mut article.children {
        if is_publication_block(child) {
            child.name = tags::PUB_INFO.to_string();
        }
    }
    true
}

/// Replace every publication block with `replacement`, placed where the first
/// block was and tagged `PubInfo`.
pub fn replace_blocks(article: &mut Element, mut replacement: Element) -> Result<()> {
    let position = article
        .children
        .iter()
        .position(is_publication_block)
        .ok_or_else(|| HarmonizerError::structure("no publication block to replace"))?;

    replacement.name = tags::PUB_INFO.to_string();
    replacement.tail = article.children[position].tail.take();
    article.children.retain(|c| !is_publication_block(c));
    article.children.insert(position, replacement);
    Ok(())
}

/// Retag every `Lieferung` in the tree to `PubInfo`.
pub fn retag_deliveries(root: &mut Element) {
    root.visit_mut(&mut |el| {
        if el.name == tags::DELIVERY {
            el.name = tags::PUB_INFO.to_string();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(tag: &str, text: &str) -> Element {
        Element::new(tag).with_text(text)
    }

    fn article(blocks: Vec<Element>) -> Element {
        let mut article = Element::new(tags::ARTICLE).with_child(Element::new(tags::MAIN_NAME));
        article.children.extend(blocks);
        article.with_child(Element::new(tags::VITA))
    }

    #[test]
    fn year_extraction() {
        assert_eq!(block_year(&block(tags::DELIVERY, "ÖBL 1815-1950, Bd. 1 (Lfg. 1, 1954)")), 1954);
        assert_eq!(block_year(&block(tags::DELIVERY, "Lfg. 2, 12345")), 0);
        assert_eq!(block_year(&block(tags::DELIVERY, "ohne Jahr")), 0);
    }

    #[test]
    fn keeps_latest_block() {
        let mut a = article(vec![
            block(tags::DELIVERY, "Lfg. 1 (1950)"),
            block(tags::DELIVERY, "Lfg. 5 (1962)"),
        ]);
        assert!(keep_latest_block(&mut a));
        let root = Element::new("Person").with_child(a);
        let blocks = publication_blocks(&root);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, tags::PUB_INFO);
        assert_eq!(blocks[0].text_content(), "Lfg. 5 (1962)");
    }

    #[test]
    fn tie_keeps_earlier_block() {
        let mut a = article(vec![
            block(tags::DELIVERY, "first"),
            block(tags::PUB_INFO, "second"),
        ]);
        assert!(keep_latest_block(&mut a));
        assert_eq!(a.child(tags::PUB_INFO).map(|b| b.text_content()), Some("first".into()));
        assert_eq!(a.children.len(), 3);
    }

    #[test]
    fn dedup_without_blocks_reports_none() {
        let mut a = article(vec![]);
        assert!(!keep_latest_block(&mut a));
    }

    #[test]
    fn replace_keeps_position_of_first_block() {
        let mut a = article(vec![
            block(tags::DELIVERY, "print"),
            block(tags::DELIVERY, "online"),
        ]);
        replace_blocks(&mut a, block(tags::DELIVERY, "secondary")).expect("replace");
        let names: Vec<_> = a.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec![tags::MAIN_NAME, tags::PUB_INFO, tags::VITA]);
        assert_eq!(a.children[1].text_content(), "secondary");
    }

    #[test]
    fn replace_without_block_is_structural_error() {
        let mut a = article(vec![]);
        let err = replace_blocks(&mut a, block(tags::PUB_INFO, "x")).unwrap_err();
        assert!(matches!(err, HarmonizerError::Structure { .. }));
    }

    #[test]
    fn classify_uses_first_block() {
        let root = Element::new("Person").with_child(article(vec![block(
            tags::PUB_INFO,
            "ÖBL Online-Edition, Lfg. 2 (2013)",
        )]));
        assert_eq!(classify(&root), Some(VariantKind::Online));
        assert_eq!(classify(&Element::new("Person")), None);
    }
}
