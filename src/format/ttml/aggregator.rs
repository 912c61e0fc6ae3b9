use super::dom::{XmlDocument, XmlElement, XmlNode};
use super::subsample::SubsampleTable;
use crate::av::{Framing, Packet, PROP_SUBSAMPLES};
use crate::error::{Result, VdkError};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use bytes::Bytes;
use log::{debug, error};

/// Timing covered by the running document.
#[derive(Debug, Clone, Copy)]
struct DocSpan {
    dts: Option<u64>,
    cts: Option<u64>,
    timescale: u32,
    start: u64,
    end: u64,
}

impl DocSpan {
    fn of(pck: &Packet) -> Self {
        let start = pck.cts.or(pck.dts).unwrap_or(0);
        Self {
            dts: pck.dts,
            cts: pck.cts,
            timescale: pck.timescale,
            start,
            end: start + pck.duration,
        }
    }

    fn extend(&mut self, pck: &Packet) {
        let start = pck.cts.or(pck.dts).unwrap_or(0);
        self.end = self.end.max(start + pck.duration);
    }
}

/// Merges per-packet TTML documents into one running document.
#[derive(Debug, Default)]
pub struct TtmlAggregator {
    merge_region: bool,
    running: Option<XmlDocument>,
    span: Option<DocSpan>,
    /// First packet of the current DASH fragment, never aliased
    held: Option<Packet>,
}

impl TtmlAggregator {
    pub fn new(merge_region: bool) -> Self {
        Self {
            merge_region,
            ..Default::default()
        }
    }

    pub fn document(&self) -> Option<&XmlDocument> {
        self.running.as_ref()
    }

    pub fn has_document(&self) -> bool {
        self.running.is_some()
    }

    /// Keeps `pck` so the next flushed document inherits its properties.
    /// A previously held packet is released.
    pub fn hold(&mut self, pck: Packet) {
        self.held = Some(pck);
    }

    pub fn is_holding(&self) -> bool {
        self.held.is_some()
    }

    pub fn ingest(&mut self, pck: &Packet) -> Result<()> {
        if pck.data.is_empty() {
            return Ok(());
        }
        let doc = parse_packet(pck)?;

        let Some(running) = self.running.as_mut() else {
            if !has_body_content(&doc.root) {
                debug!("Discarding TTML document without body content");
                return Ok(());
            }
            self.running = Some(doc);
            self.span = Some(DocSpan::of(pck));
            return Ok(());
        };

        merge_document(running, doc, self.merge_region);
        if let Some(span) = self.span.as_mut() {
            span.extend(pck);
        }
        Ok(())
    }

    /// Serializes and releases the running document as one complete file.
    pub fn flush(&mut self) -> Result<Option<Packet>> {
        let Some(mut doc) = self.running.take() else {
            return Ok(None);
        };
        let span = self.span.take();

        if self.merge_region {
            if let Some(body) = doc.root.child_mut("body") {
                body.children.retain(|node| match node {
                    XmlNode::Element(div) if div.local_name() == "div" => !is_vacant_div(div),
                    _ => true,
                });
            }
        }

        let text = doc.serialize()?;
        let mut out = Packet::new(Bytes::from(text));
        if let Some(span) = span {
            out.dts = span.dts;
            out.cts = span.cts;
            out.timescale = span.timescale;
            out.duration = span.end - span.start;
        }
        if let Some(held) = self.held.take() {
            out.props.merge(&held.props);
            out.sap = held.sap;
        }
        out.dependency_flags = 0;
        out.byte_offset = None;
        out.framing = Framing {
            start: true,
            end: true,
        };
        Ok(Some(out))
    }
}

/// Single-packet rendering: embeds subsample payloads and reserializes.
///
/// Returns `None` when the packet has no subsample table and can be
/// forwarded as is.
pub fn render_packet(pck: &Packet) -> Result<Option<Bytes>> {
    if !pck.props.contains(PROP_SUBSAMPLES) {
        return Ok(None);
    }
    let doc = parse_packet(pck)?;
    Ok(Some(Bytes::from(doc.serialize()?)))
}

/// Parses the text part of a packet and embeds its binary subsamples.
pub fn parse_packet(pck: &Packet) -> Result<XmlDocument> {
    let data = &pck.data[..];
    let table = match pck.props.get_data(PROP_SUBSAMPLES) {
        Some(raw) => Some(SubsampleTable::parse(raw)?),
        None => None,
    };
    let text_len = match &table {
        Some(table) => {
            let declared = table.text_size();
            if declared > data.len() {
                return Err(VdkError::NonCompliantBitstream(format!(
                    "TTML text size {} exceeds packet size {}",
                    declared,
                    data.len()
                )));
            }
            declared
        }
        None => data.len(),
    };

    let text = std::str::from_utf8(&data[..text_len])
        .map_err(|e| VdkError::NonCompliantBitstream(format!("TTML text is not UTF-8: {}", e)))?;
    let mut doc = XmlDocument::parse(text.trim_end_matches('\0'))
        .map_err(|e| VdkError::NonCompliantBitstream(e.to_string()))?;

    if let Some(table) = &table {
        embed_data(&mut doc.root, &data[text_len..], table)?;
    }
    Ok(doc)
}

/// Index `N` of a `urn:...:N[.ext]` reference.
fn urn_index(value: &str) -> Option<usize> {
    if !value.starts_with("urn:") {
        return None;
    }
    let last = &value[value.rfind(':')? + 1..];
    let digits = last.split('.').next()?;
    digits.parse().ok().filter(|n| *n > 0)
}

fn embed_data(element: &mut XmlElement, aux: &[u8], table: &SubsampleTable) -> Result<()> {
    let mut has_src = false;
    let mut reference = None;
    for (pos, attr) in element.attributes.iter().enumerate() {
        if attr.name != "src" {
            continue;
        }
        has_src = true;
        if let Some(index) = urn_index(&attr.value) {
            reference = Some((pos, index));
            break;
        }
    }

    if let Some((pos, index)) = reference {
        let range = table.payload_range(index, aux.len()).map_err(|e| {
            error!("Corrupted subsample reference in <{}>: {}", element.name, e);
            e
        })?;
        element.attributes.remove(pos);

        let mut data = XmlElement::new("data");
        data.children
            .push(XmlNode::Text(BASE64_STANDARD.encode(&aux[range])));
        // @type ends up on <data>, wherever it was declared
        if let Some(kind) = element.take_attr("type") {
            data.attributes.push(kind);
        }

        if element.local_name() == "source" {
            element.children.push(XmlNode::Element(data));
        } else {
            let mut source = XmlElement::new("source");
            source.children.push(XmlNode::Element(data));
            element.children.push(XmlNode::Element(source));
        }
        return Ok(());
    }

    // External resource, leave the subtree alone
    if has_src {
        return Ok(());
    }

    for child in element.children.iter_mut() {
        if let XmlNode::Element(child) = child {
            embed_data(child, aux, table)?;
        }
    }
    Ok(())
}

fn has_body_content(root: &XmlElement) -> bool {
    root.child("body")
        .map(|body| body.elements().next().is_some())
        .unwrap_or(false)
}

/// A region div left with nothing but incidental text.
fn is_vacant_div(div: &XmlElement) -> bool {
    div.children.len() <= 1 && !matches!(div.children.first(), Some(XmlNode::Element(_)))
}

fn take_element(parent: &mut XmlElement, index: usize) -> Option<XmlElement> {
    match parent.children.remove(index) {
        XmlNode::Element(e) => Some(e),
        _ => None,
    }
}

fn merge_document(running: &mut XmlDocument, incoming: XmlDocument, merge_region: bool) {
    let mut src_root = incoming.root;
    let dst_root = &mut running.root;

    if let Some(src_head) = src_root
        .child_index("head")
        .and_then(|i| take_element(&mut src_root, i))
    {
        match dst_root.child_mut("head") {
            Some(dst_head) => merge_children(dst_head, src_head),
            None => {
                let pos = dst_root
                    .child_index("body")
                    .unwrap_or(dst_root.children.len());
                dst_root.children.insert(pos, XmlNode::Element(src_head));
            }
        }
    }

    if let Some(src_body) = src_root
        .child_index("body")
        .and_then(|i| take_element(&mut src_root, i))
    {
        match dst_root.child_mut("body") {
            Some(dst_body) => merge_body(dst_body, src_body, merge_region),
            None => dst_root.children.push(XmlNode::Element(src_body)),
        }
    }
}

/// Recursive merge: a child already exists if a sibling has the same name
/// and the same attribute set.
fn merge_children(dst: &mut XmlElement, src: XmlElement) {
    for node in src.children {
        let XmlNode::Element(child) = node else {
            continue;
        };
        let existing = dst
            .children
            .iter_mut()
            .filter_map(XmlNode::as_element_mut)
            .find(|e| e.name == child.name && e.same_attributes(&child));
        match existing {
            Some(existing) => merge_children(existing, child),
            None => dst.children.push(XmlNode::Element(child)),
        }
    }
}

fn merge_body(dst: &mut XmlElement, src: XmlElement, merge_region: bool) {
    let mut div_idx = 0;
    for node in src.children {
        let XmlNode::Element(div) = node else {
            continue;
        };
        if div.local_name() != "div" {
            continue;
        }
        match target_div(dst, &div, div_idx, merge_region) {
            Some(i) => {
                if let Some(target) = dst.children[i].as_element_mut() {
                    merge_div(target, div);
                }
            }
            None => insert_div(dst, div),
        }
        div_idx += 1;
    }
}

fn target_div(dst: &XmlElement, div: &XmlElement, div_idx: usize, merge_region: bool) -> Option<usize> {
    if merge_region {
        if let Some(region) = div.attr("region") {
            return dst.children.iter().position(|c| {
                c.as_element()
                    .map(|e| e.local_name() == "div" && e.attr("region") == Some(region))
                    .unwrap_or(false)
            });
        }
    }
    dst.children
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_named("div"))
        .nth(div_idx)
        .map(|(i, _)| i)
}

/// Position just before a trailing text node, or the end.
fn tail_position(parent: &XmlElement) -> usize {
    match parent.children.last() {
        Some(XmlNode::Text(_)) => parent.children.len() - 1,
        _ => parent.children.len(),
    }
}

fn insert_div(dst: &mut XmlElement, div: XmlElement) {
    let pos = dst
        .children
        .iter()
        .rposition(|c| c.is_named("div"))
        .map(|i| i + 1)
        .unwrap_or_else(|| tail_position(dst));
    dst.children.insert(pos, XmlNode::Element(div));
}

fn merge_div(dst: &mut XmlElement, src: XmlElement) {
    let mut pending_text: Option<XmlNode> = None;
    for node in src.children {
        match node {
            XmlNode::Text(_) => pending_text = Some(node),
            XmlNode::Element(p) if p.local_name() == "p" => {
                let duplicate = dst
                    .elements()
                    .any(|e| e.local_name() == "p" && e.same_attributes(&p));
                if duplicate {
                    pending_text = None;
                    continue;
                }
                let mut pos = tail_position(dst);
                if let Some(text) = pending_text.take() {
                    dst.children.insert(pos, text);
                    pos += 1;
                }
                dst.children.insert(pos, XmlNode::Element(p));
            }
            _ => pending_text = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::subsample::encode_table;
    use super::*;
    use crate::av::PropertyValue;
    use pretty_assertions::assert_eq;

    fn doc(body: &str) -> String {
        format!(
            r#"<tt xmlns="http://www.w3.org/ns/ttml"><head><styling><style xml:id="s1"/></styling></head><body>{}</body></tt>"#,
            body
        )
    }

    fn pck(text: &str, cts: u64) -> Packet {
        Packet::new(text.as_bytes().to_vec())
            .with_cts(cts)
            .with_duration(1000)
    }

    fn divs(agg: &TtmlAggregator) -> Vec<XmlElement> {
        agg.document()
            .unwrap()
            .root
            .child("body")
            .unwrap()
            .elements()
            .filter(|e| e.local_name() == "div")
            .cloned()
            .collect()
    }

    fn p_begins(div: &XmlElement) -> Vec<String> {
        div.elements()
            .filter(|e| e.local_name() == "p")
            .map(|p| p.attr("begin").unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_same_document_twice_is_idempotent() {
        let text = doc(r#"<div><p begin="0s" end="1s">hello</p></div>"#);
        let mut agg = TtmlAggregator::new(false);
        agg.ingest(&pck(&text, 0)).unwrap();
        agg.ingest(&pck(&text, 0)).unwrap();

        let divs = divs(&agg);
        assert_eq!(divs.len(), 1);
        assert_eq!(p_begins(&divs[0]), vec!["0s"]);
        // head merged without duplicating the style
        let head = agg.document().unwrap().root.child("head").unwrap();
        assert_eq!(head.child("styling").unwrap().elements().count(), 1);
    }

    #[test]
    fn test_distinct_regions_make_two_divs() {
        let mut agg = TtmlAggregator::new(true);
        agg.ingest(&pck(&doc(r#"<div region="A"><p begin="0s">a</p></div>"#), 0))
            .unwrap();
        agg.ingest(&pck(&doc(r#"<div region="B"><p begin="0s">b</p></div>"#), 0))
            .unwrap();
        let divs = divs(&agg);
        assert_eq!(divs.len(), 2);
        assert_eq!(divs[0].attr("region"), Some("A"));
        assert_eq!(divs[1].attr("region"), Some("B"));
    }

    #[test]
    fn test_positional_merge_appends_new_cues() {
        let mut agg = TtmlAggregator::new(false);
        agg.ingest(&pck(&doc("<div>\n<p begin=\"0s\">a</p>\n</div>"), 0))
            .unwrap();
        agg.ingest(&pck(&doc("<div>\n<p begin=\"1s\">b</p>\n</div>"), 1000))
            .unwrap();
        let divs = divs(&agg);
        assert_eq!(divs.len(), 1);
        assert_eq!(p_begins(&divs[0]), vec!["0s", "1s"]);
        // inter-cue whitespace carried along, trailing text stays last
        let kinds: Vec<bool> = divs[0].children.iter().map(|c| c.is_text()).collect();
        assert_eq!(kinds, vec![true, false, true, false, true]);
    }

    #[test]
    fn test_first_document_needs_body_content() {
        let mut agg = TtmlAggregator::new(false);
        agg.ingest(&pck("<tt><head/><body/></tt>", 0)).unwrap();
        assert!(!agg.has_document());
        agg.ingest(&pck("", 0)).unwrap();
        assert!(!agg.has_document());
        agg.ingest(&pck(&doc("<div><p>x</p></div>"), 0)).unwrap();
        assert!(agg.has_document());
    }

    #[test]
    fn test_head_moved_when_missing() {
        let mut agg = TtmlAggregator::new(false);
        agg.ingest(&pck("<tt><body><div><p>x</p></div></body></tt>", 0))
            .unwrap();
        agg.ingest(&pck(&doc("<div><p>x</p></div>"), 0)).unwrap();
        let root = &agg.document().unwrap().root;
        assert_eq!(root.child_index("head"), Some(0));
        assert_eq!(root.child_index("body"), Some(1));
    }

    #[test]
    fn test_flush_serializes_once_and_inherits_held_props() {
        let mut agg = TtmlAggregator::new(false);
        agg.ingest(&pck(&doc("<div><p begin=\"0s\">x</p></div>"), 0))
            .unwrap();
        agg.ingest(&pck(&doc("<div><p begin=\"1s\">y</p></div>"), 1000))
            .unwrap();
        let held = Packet::new(vec![])
            .with_property("segment", PropertyValue::Uint(7))
            .with_dependency_flags(3)
            .with_byte_offset(99);
        agg.hold(held);

        let out = agg.flush().unwrap().unwrap();
        assert_eq!(out.framing, Framing { start: true, end: true });
        assert_eq!(out.props.get_uint("segment"), Some(7));
        assert_eq!(out.dependency_flags, 0);
        assert_eq!(out.byte_offset, None);
        assert_eq!(out.cts, Some(0));
        assert_eq!(out.duration, 2000);
        assert!(!agg.has_document());
        assert!(!agg.is_holding());
        assert!(agg.flush().unwrap().is_none());

        let text = String::from_utf8(out.data.to_vec()).unwrap();
        let reparsed = XmlDocument::parse(&text).unwrap();
        let div = reparsed.root.child("body").unwrap().child("div").unwrap();
        assert_eq!(p_begins(div), vec!["0s", "1s"]);
    }

    #[test]
    fn test_flush_drops_vacant_region_divs() {
        let mut agg = TtmlAggregator::new(true);
        agg.ingest(&pck(
            &doc("<div region=\"A\"><p>x</p></div><div region=\"B\">\n</div><div region=\"C\"/>"),
            0,
        ))
        .unwrap();
        let out = agg.flush().unwrap().unwrap();
        let text = String::from_utf8(out.data.to_vec()).unwrap();
        assert!(text.contains("region=\"A\""));
        assert!(!text.contains("region=\"B\""));
        assert!(!text.contains("region=\"C\""));
    }

    fn packet_with_subsamples(xml: &str, payloads: &[&[u8]]) -> Packet {
        let mut sizes = vec![xml.len() as u32];
        sizes.extend(payloads.iter().map(|p| p.len() as u32));
        let mut data = xml.as_bytes().to_vec();
        for p in payloads {
            data.extend_from_slice(p);
        }
        Packet::new(data).with_property(
            PROP_SUBSAMPLES,
            PropertyValue::Data(Bytes::from(encode_table(&sizes))),
        )
    }

    #[test]
    fn test_embeds_subsample_as_base64() {
        let xml = doc(r#"<div><p><span><image src="urn:mpeg:14496-30:subs:2" type="image/png"/></span></p></div>"#);
        let first: &[u8] = b"\x89PNG-one";
        let second: &[u8] = b"\x89PNG-two-longer";
        let doc = parse_packet(&packet_with_subsamples(&xml, &[first, second])).unwrap();

        let image = doc.root.child("body").unwrap().child("div").unwrap()
            .child("p").unwrap().child("span").unwrap().child("image").unwrap();
        assert_eq!(image.attr("src"), None);
        assert_eq!(image.attr("type"), None);
        let data = image.child("source").unwrap().child("data").unwrap();
        assert_eq!(data.attr("type"), Some("image/png"));
        assert_eq!(BASE64_STANDARD.decode(data.text()).unwrap(), second);
    }

    #[test]
    fn test_source_element_gets_data_directly() {
        let xml = doc(r#"<div><source src="urn:x:1.png"/></div>"#);
        let doc = parse_packet(&packet_with_subsamples(&xml, &[b"abc"])).unwrap();
        let source = doc.root.child("body").unwrap().child("div").unwrap().child("source").unwrap();
        assert!(source.child("source").is_none());
        assert_eq!(BASE64_STANDARD.decode(source.child("data").unwrap().text()).unwrap(), b"abc");
    }

    #[test]
    fn test_external_src_is_untouched() {
        let xml = doc(r#"<div><image src="http://example.com/a.png"><image src="urn:x:1"/></image></div>"#);
        let doc = parse_packet(&packet_with_subsamples(&xml, &[b"abc"])).unwrap();
        let outer = doc.root.child("body").unwrap().child("div").unwrap().child("image").unwrap();
        assert_eq!(outer.attr("src"), Some("http://example.com/a.png"));
        // not recursed into
        assert_eq!(outer.child("image").unwrap().attr("src"), Some("urn:x:1"));
    }

    #[test]
    fn test_bad_subsample_reference_is_non_compliant() {
        let xml = doc(r#"<div><image src="urn:x:3"/></div>"#);
        match parse_packet(&packet_with_subsamples(&xml, &[b"abc"])) {
            Err(VdkError::NonCompliantBitstream(_)) => {}
            other => panic!("expected non-compliant, got {:?}", other),
        }
    }

    #[test]
    fn test_text_size_larger_than_packet() {
        let xml = doc("<div><p>x</p></div>");
        let mut pck = packet_with_subsamples(&xml, &[]);
        pck.data = pck.data.slice(..10);
        let mut agg = TtmlAggregator::new(false);
        assert!(matches!(agg.ingest(&pck), Err(VdkError::NonCompliantBitstream(_))));
        assert!(!agg.has_document());
    }

    #[test]
    fn test_render_packet() {
        let plain = pck(&doc("<div/>"), 0);
        assert!(render_packet(&plain).unwrap().is_none());

        let xml = doc(r#"<div><image src="urn:x:1"/></div>"#);
        let rendered = render_packet(&packet_with_subsamples(&xml, &[b"zz"])).unwrap().unwrap();
        let text = String::from_utf8(rendered.to_vec()).unwrap();
        assert!(text.contains("<source><data>eno=</data></source>"));
    }

    #[test]
    fn test_urn_index() {
        assert_eq!(urn_index("urn:mpeg:14496-30:subs:3"), Some(3));
        assert_eq!(urn_index("urn:x:12.png"), Some(12));
        assert_eq!(urn_index("urn:x:0"), None);
        assert_eq!(urn_index("urn:x:abc"), None);
        assert_eq!(urn_index("file:1"), None);
    }
}
