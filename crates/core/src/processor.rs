//! The page capture pass.
//!
//! One page's layout tree is walked once, depth-first in rendering order.
//! Lines and figures hand out reading-order sequence numbers to the
//! positions of the page's annotations and outlines; characters are routed to
//! the annotations whose boxes they fall in; a bounded window of recent text
//! supplies context to strike-outs and carets.

use std::collections::{BTreeSet, VecDeque};

use smallvec::SmallVec;

use crate::annotation::Annotation;
use crate::document::Page;
use crate::layout::{LTChar, LTComponent, LTItem, LTPage};
use crate::outline::Outline;

/// Streams one page's layout through the capture pass.
///
/// Assigns sequence numbers to every annotation and outline on the page and
/// captures annotation text and context. The page must be sorted afterwards.
pub fn capture_page(page: &mut Page, layout: &LTPage, context_chars: usize) {
    let pageno = page.pageno;
    let mut state = CaptureState::new(&mut page.annots, &mut page.outlines, context_chars);
    for item in layout.iter() {
        state.render(item, false);
    }
    state.finish();
    tracing::debug!(
        "page #{}: {} components, {} characters",
        pageno + 1,
        state.compseq,
        state.charseq
    );
}

struct CaptureState<'p> {
    annots: &'p mut [Annotation],
    outlines: &'p mut [Outline],
    context_chars: usize,
    /// Sequence number of the most recent line/figure-like component.
    compseq: u32,
    /// Sequence number of the most recent captured character.
    charseq: u64,
    /// The last `context_chars` captured characters.
    recent_text: VecDeque<String>,
    /// Annotations hit by the most recent character.
    lasthit: SmallVec<[usize; 4]>,
    /// Annotations hit anywhere on the current line.
    curline: BTreeSet<usize>,
    /// (charseq, annotation) pairs awaiting post-context, sorted by charseq.
    context_subscribers: VecDeque<(u64, usize)>,
    /// Key of each annotation's pending subscription, if any.
    subscription: Vec<Option<u64>>,
}

impl<'p> CaptureState<'p> {
    fn new(annots: &'p mut [Annotation], outlines: &'p mut [Outline], context_chars: usize) -> Self {
        let subscription = vec![None; annots.len()];
        Self {
            annots,
            outlines,
            context_chars,
            compseq: 0,
            charseq: 0,
            recent_text: VecDeque::with_capacity(context_chars),
            lasthit: SmallVec::new(),
            curline: BTreeSet::new(),
            context_subscribers: VecDeque::new(),
            subscription,
        }
    }

    fn render(&mut self, item: &LTItem, pageseq_nested: bool) {
        // Assign sequence numbers based on proximity to lines of text (and
        // figures), before descending so nested items see the right line.
        let mut nested = false;
        if let Some(component) = item.component()
            && (pageseq_nested || matches!(item, LTItem::TextLine(_) | LTItem::Figure(_)))
        {
            nested = self.update_pageseq(item, &component);
        }

        match item {
            LTItem::TextLine(_) | LTItem::TextBox(_) | LTItem::Figure(_) | LTItem::Container(_) => {
                for child in item.children().unwrap_or_default() {
                    self.render(child, nested);
                }
                // Close out the final line of a text box, which need not end
                // with an explicit line break.
                if matches!(item, LTItem::TextBox(_)) {
                    self.capture_char("\n");
                }
            }
            LTItem::Char(ch) => self.render_char(ch),
            // Whitespace the layout analyzer inferred; it has no position of its own.
            LTItem::Anno(anno) => self.capture_char(anno.get_text()),
            LTItem::Graphic(_) => {}
        }
    }

    /// Offers a component's sequence number to every position on the page.
    ///
    /// Returns true if several positions fell inside the component and it has
    /// several children: the number is then withdrawn, and the children are
    /// offered their own numbers to break the tie.
    fn update_pageseq(&mut self, item: &LTItem, component: &LTComponent) -> bool {
        self.compseq += 1;
        let seq = self.compseq;

        let mut hits = 0;
        for a in self.annots.iter_mut() {
            if a.pos.update_pageseq(component, seq) {
                hits += 1;
            }
        }
        for o in self.outlines.iter_mut() {
            if o.pos_mut().update_pageseq(component, seq) {
                hits += 1;
            }
        }

        if hits > 1 && item.children().is_some_and(|c| c.len() > 1) {
            tracing::trace!("component {seq} hit by {hits} positions; descending");
            for a in self.annots.iter_mut() {
                a.pos.discard_pageseq(seq);
            }
            for o in self.outlines.iter_mut() {
                o.pos_mut().discard_pageseq(seq);
            }
            return true;
        }
        false
    }

    /// Records which annotations the character hits.
    fn testboxes(&mut self, ch: &LTChar) {
        self.lasthit = self
            .annots
            .iter()
            .enumerate()
            .filter(|(_, a)| a.hit(ch))
            .map(|(i, _)| i)
            .collect();
        self.curline.extend(self.lasthit.iter().copied());
    }

    fn render_char(&mut self, ch: &LTChar) {
        self.testboxes(ch);

        let charseq = self.charseq + 1;
        for i in 0..self.lasthit.len() {
            let idx = self.lasthit[i];
            if self.annots[idx].wants_context() {
                self.update_context(idx, charseq);
            }
        }

        self.capture_char(ch.get_text());
    }

    /// Gives a first-hit annotation its pre-context and (re)subscribes it for
    /// post-context starting after `charseq`.
    fn update_context(&mut self, idx: usize, charseq: u64) {
        if let Some(key) = self.subscription[idx] {
            // More text captured: restart the post-context window.
            self.unsubscribe(key, idx);
        } else if self.annots[idx].pre_context.is_none() {
            let pre_context: String = self.recent_text.iter().map(String::as_str).collect();
            self.annots[idx].set_pre_context(pre_context);
        } else {
            // Post-context already delivered; it stays as it was.
            tracing::debug!("{} hit again after its context was complete", self.annots[idx]);
            return;
        }

        debug_assert!(
            self.context_subscribers
                .back()
                .is_none_or(|&(last, _)| last <= charseq)
        );
        self.context_subscribers.push_back((charseq, idx));
        self.subscription[idx] = Some(charseq);
    }

    fn unsubscribe(&mut self, key: u64, idx: usize) {
        let start = self.context_subscribers.partition_point(|&(k, _)| k < key);
        let found = (start..self.context_subscribers.len())
            .take_while(|&i| self.context_subscribers[i].0 == key)
            .find(|&i| self.context_subscribers[i].1 == idx);
        match found {
            Some(i) => {
                self.context_subscribers.remove(i);
            }
            None => debug_assert!(false, "no context subscription ({key}, {idx})"),
        }
        self.subscription[idx] = None;
    }

    /// Captures one character (or inferred whitespace) of page text.
    fn capture_char(&mut self, text: &str) {
        self.charseq += 1;
        let charseq = self.charseq;

        if text == "\n" {
            // Broadcast the newline to every annotation that received any
            // text on the line, even if the line's last character was not
            // covered by their boxes.
            for idx in std::mem::take(&mut self.curline) {
                self.annots[idx].capture("\n", charseq);
            }
        } else {
            for &idx in &self.lasthit {
                self.annots[idx].capture(text, charseq);
            }
        }

        if self.context_chars > 0 {
            if self.recent_text.len() == self.context_chars {
                self.recent_text.pop_front();
            }
            self.recent_text.push_back(text.to_string());
        }

        // Deliver post-context to subscribers whose window is now full
        while let Some(&(key, idx)) = self.context_subscribers.front() {
            debug_assert!(key <= charseq);
            if key + self.context_chars as u64 > charseq {
                break;
            }
            self.context_subscribers.pop_front();
            self.subscription[idx] = None;
            let post_context = self.recent(self.context_chars);
            self.annots[idx].set_post_context(post_context, key);
        }
    }

    /// The last `n` captured characters, as one string.
    fn recent(&self, n: usize) -> String {
        let skip = self.recent_text.len().saturating_sub(n);
        self.recent_text
            .iter()
            .skip(skip)
            .map(String::as_str)
            .collect()
    }

    /// Flushes whatever context is available to remaining subscribers.
    fn finish(&mut self) {
        while let Some((key, idx)) = self.context_subscribers.pop_front() {
            self.subscription[idx] = None;
            let available = usize::try_from(self.charseq - key).unwrap_or(usize::MAX);
            let post_context = self.recent(available);
            self.annots[idx].set_post_context(post_context, key);
        }
    }
}
