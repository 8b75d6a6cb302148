//! Whole-document extraction.
//!
//! Pages are processed strictly in order. Each page is built from its raw
//! record, receives the outlines that target it, builds its annotations,
//! and (if it has either) is streamed through the capture pass, sorted and
//! post-processed before the next page starts.

use std::collections::HashMap;

use rustc_hash::FxHashMap;

use crate::annotation::{Annotation, AnnotationType, Rgb};
use crate::document::{Document, Page};
use crate::error::{AnnotError, Result};
use crate::geometry::BBox;
use crate::outline::{PageTarget, PendingOutline, get_outlines};
use crate::page_labels::PageLabels;
use crate::params::ExtractParams;
use crate::pdftypes::{PDFObject, Resolve};
use crate::pos::PageRef;
use crate::processor::capture_page;
use crate::source::PdfSource;
use crate::utils::{cleanup_text, decode_datetime, decode_text};

/// Annotation subtypes that are expected and silently ignored.
const IGNORED_SUBTYPES: [&str; 2] = ["Link", "Popup"];

/// Extracts annotations and outlines from every page of a document.
pub fn process_document<S: PdfSource + ?Sized>(src: &S, params: &ExtractParams) -> Result<Document> {
    process_document_with_progress(src, params, |_| {})
}

/// Like [`process_document`], calling `progress` with each page's 1-based
/// number before the page is processed.
pub fn process_document_with_progress<S, F>(src: &S, params: &ExtractParams, mut progress: F) -> Result<Document>
where
    S: PdfSource + ?Sized,
    F: FnMut(usize),
{
    params.validate()?;
    let page_count = src.page_count();

    // Outlines name their page by index or by object id; they wait in these
    // tables until that page is reached.
    let mut outlines_by_pageno: FxHashMap<usize, Vec<PendingOutline>> = FxHashMap::default();
    let mut outlines_by_objid: FxHashMap<u32, Vec<PendingOutline>> = FxHashMap::default();
    match get_outlines(src) {
        Ok(Some(outlines)) => {
            for o in outlines {
                match o.target_page {
                    PageTarget::ObjId(objid) => outlines_by_objid.entry(objid).or_default().push(o),
                    PageTarget::Index(pageno) if pageno < page_count => {
                        outlines_by_pageno.entry(pageno).or_default().push(o)
                    }
                    PageTarget::Index(pageno) => {
                        tracing::warn!("Outline '{}' targets missing page index {pageno}", o.title)
                    }
                }
            }
        }
        Ok(None) => tracing::info!("Document doesn't include outlines (\"bookmarks\")"),
        Err(e) => tracing::warn!("Failed to retrieve outlines: {e}"),
    }

    let mut labels = if params.use_page_labels {
        PageLabels::from_source(src)
    } else {
        PageLabels::disabled()
    };

    let mut doc = Document::new();
    for pageno in 0..page_count {
        progress(pageno + 1);

        let raw = src.page(pageno)?;
        let mut page = Page::new(
            pageno,
            raw.pageid,
            labels.next_label(),
            raw.mediabox,
            params.columns_per_page,
        )?;
        let page_ref = page.page_ref();

        // Resolve any outlines referring to this page, by object id or number.
        let pending = outlines_by_objid
            .remove(&raw.pageid.objid)
            .into_iter()
            .chain(outlines_by_pageno.remove(&pageno))
            .flatten();
        for o in pending {
            match o.resolve(page_ref, raw.pageid.objid) {
                Ok(outline) => page.outlines.push(outline),
                Err(e) => tracing::error!("{e}"),
            }
        }

        for pa in &raw.annots {
            match mkannotation(src, pa, page_ref) {
                Ok(Some(annot)) => page.annots.push(annot),
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping annotation on {page}: {e}"),
            }
        }

        // Pages with neither outlines nor annotations need no layout.
        if page.annots.is_empty() && page.outlines.is_empty() {
            doc.pages.push(page);
            continue;
        }

        match src.layout(pageno) {
            Ok(layout) => capture_page(&mut page, &layout, params.context_chars),
            Err(e) => tracing::warn!("Layout analysis failed for {page}; order is approximate: {e}"),
        }

        page.sort_objects();
        page.postprocess_annots();
        doc.pages.push(page);
    }

    // All outlines should be resolved by now.
    if !outlines_by_pageno.is_empty() || !outlines_by_objid.is_empty() {
        let unresolved: Vec<_> = outlines_by_pageno
            .values()
            .chain(outlines_by_objid.values())
            .flatten()
            .map(|o| o.title.as_str())
            .collect();
        tracing::error!(
            "{}",
            AnnotError::OutlineInvariant(format!(
                "outlines target pages that were never reached: {unresolved:?}"
            ))
        );
        debug_assert!(unresolved.is_empty(), "unresolved outlines: {unresolved:?}");
    }

    Ok(doc)
}

/// Builds an Annotation from a raw annotation dictionary.
///
/// Returns `Ok(None)` for annotation types that carry no reviewable content.
pub fn mkannotation<S: PdfSource + ?Sized>(src: &S, pa: &PDFObject, page: PageRef) -> Result<Option<Annotation>> {
    let objid = pa.as_ref().ok().map(|r| r.objid);
    let pa = src.resolve1(pa)?;
    let dict = pa.as_dict()?;

    let subtype = src
        .resolve_key(dict, "Subtype")?
        .ok_or_else(|| AnnotError::KeyError("Subtype".to_string()))?;
    let subtype = subtype.as_name()?;
    if IGNORED_SUBTYPES.contains(&subtype) {
        return Ok(None);
    }
    let Ok(subtype) = subtype.parse::<AnnotationType>() else {
        tracing::debug!("Ignoring unsupported annotation subtype {subtype}");
        return Ok(None);
    };

    let quadpoints = src
        .resolve_key(dict, "QuadPoints")?
        .map(|qp| numbers(src, &qp))
        .transpose()?;
    let rect = match src.resolve_key(dict, "Rect")? {
        Some(rect) => match numbers(src, &rect)?.as_slice() {
            &[x0, y0, x1, y1] => Some(BBox::normalized(x0, y0, x1, y1)?),
            _ => {
                return Err(AnnotError::TypeError {
                    expected: "rect of 4 numbers",
                    got: "array of another length",
                });
            }
        },
        None => None,
    };

    let mut annot = Annotation::new(page, subtype, quadpoints.as_deref(), rect)?;
    annot.objid = objid;

    // decode as string, normalise line endings, replace special characters
    annot.contents = text_field(src, dict, "Contents")?.map(|c| cleanup_text(&c));
    annot.author = text_field(src, dict, "T")?;
    annot.name = text_field(src, dict, "NM")?;

    // Some apps set only the modification date; poppler-based apps use 'M'.
    let created = match text_field(src, dict, "CreationDate")? {
        Some(d) => Some(d),
        None => match text_field(src, dict, "ModDate")? {
            Some(d) => Some(d),
            None => text_field(src, dict, "M")?,
        },
    };
    if let Some(created) = created {
        annot.created = decode_datetime(&created);
        if annot.created.is_none() {
            tracing::warn!("Failed to parse date '{created}' of {annot}");
        }
    }

    if let Some(color) = src.resolve_key(dict, "C")? {
        match numbers(src, &color)?.as_slice() {
            &[r, g, b] => match Rgb::new(r, g, b) {
                Ok(rgb) => annot.color = Some(rgb),
                Err(e) => tracing::warn!("Ignoring colour of {annot}: {e}"),
            },
            // Transparent
            [] => {}
            other => tracing::warn!(
                "Ignoring {}-component colour of {annot}",
                other.len()
            ),
        }
    }

    if let Some(irt) = dict.get("IRT") {
        match irt.as_ref() {
            Ok(r) => {
                annot.reply_ref = Some(*r);
                annot.is_group_child = src
                    .resolve_key(dict, "RT")?
                    .is_some_and(|rt| rt.as_name().is_ok_and(|n| n == "Group"));
            }
            Err(_) => tracing::warn!("Ignoring non-reference IRT of {annot}"),
        }
    }

    Ok(Some(annot))
}

/// Reads an array of numbers, resolving each element.
fn numbers<R: Resolve + ?Sized>(src: &R, obj: &PDFObject) -> Result<Vec<f64>> {
    obj.as_array()?
        .iter()
        .map(|v| src.resolve1(v)?.as_num())
        .collect()
}

/// Reads and decodes an optional text string entry.
fn text_field<R: Resolve + ?Sized>(
    src: &R,
    dict: &HashMap<String, PDFObject>,
    key: &str,
) -> Result<Option<String>> {
    match src.resolve_key(dict, key)? {
        Some(obj) => Ok(Some(decode_text(obj.as_string()?))),
        None => Ok(None),
    }
}
