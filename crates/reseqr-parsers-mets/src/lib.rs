use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use reseqr_core::{FileDescriptor, MetadataGroup, ReseqrError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Typed result of matching a raw FILEID against the imaging services
/// pattern. `group_key` and `seq` together reconstruct the matched payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileId {
    pub group_key: String,
    pub seq: String,
}

impl FileId {
    /// The `<groupKey>_<seq>` payload the pattern matched, without the
    /// imaging services prefix.
    pub fn payload(&self) -> String {
        format!("{}_{}", self.group_key, self.seq)
    }
}

/// Compiled FILEID pattern: `<imaging services prefix><groupKey>_<seq>`.
#[derive(Debug, Clone)]
pub struct FileIdPattern {
    re: Regex,
}

impl FileIdPattern {
    pub fn new(imaging_services_prefix: &str) -> Self {
        let re = Regex::new(&format!(
            r"^{}(\w+)_(\d+)$",
            regex::escape(imaging_services_prefix)
        ))
        .unwrap();
        Self { re }
    }

    pub fn parse(&self, raw: &str) -> Option<FileId> {
        let caps = self.re.captures(raw)?;
        Some(FileId {
            group_key: caps[1].to_string(),
            seq: caps[2].to_string(),
        })
    }
}

/// What the batch report prints for each METS document.
#[derive(Debug, Clone)]
pub struct MetsDocumentSummary {
    pub document: String,
    pub group_key: String,
    pub items: usize,
}

struct PendingPage {
    order_raw: Option<String>,
    fileids: Vec<String>,
}

fn local_name(qname: &[u8]) -> &[u8] {
    match qname.iter().rposition(|b| *b == b':') {
        Some(i) => &qname[i + 1..],
        None => qname,
    }
}

fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ReseqrError::Xml(err.to_string()))?;
        if local_name(attr.key.as_ref()) == name {
            return Ok(Some(String::from_utf8_lossy(&attr.value).into_owned()));
        }
    }
    Ok(None)
}

fn finish_page(page: PendingPage, pattern: &FileIdPattern) -> Result<(FileId, u32)> {
    let order_raw = page.order_raw.clone().unwrap_or_default();
    if page.fileids.len() != 1 {
        return Err(ReseqrError::FptrCardinality {
            order: order_raw,
            count: page.fileids.len(),
        }
        .into());
    }
    if page.order_raw.is_none() {
        return Err(ReseqrError::MissingOrder.into());
    }
    let order: u32 = order_raw
        .parse()
        .ok()
        .filter(|o| *o >= 1)
        .ok_or_else(|| ReseqrError::BadOrder(order_raw.clone()))?;
    let raw = &page.fileids[0];
    let id = pattern
        .parse(raw)
        .ok_or_else(|| ReseqrError::BadFileId(raw.clone()))?;
    Ok((id, order))
}

/// Parse one METS document into a `MetadataGroup`.
///
/// Traversal is namespace-agnostic: only local element names matter.
/// Page entries live at `structMap/div/div`; each must carry a numeric
/// `ORDER` and exactly one `fptr` child whose FILEID matches `pattern`.
/// `extension` is appended to the derived filename here, the FILEID itself
/// never carries one.
pub fn parse_mets_str(
    xml: &str,
    pattern: &FileIdPattern,
    extension: &str,
) -> Result<MetadataGroup> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut in_struct_map = false;
    let mut div_level = 0usize;
    let mut page: Option<PendingPage> = None;

    let mut items: Vec<FileDescriptor> = Vec::new();
    let mut keys: BTreeSet<String> = BTreeSet::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"structMap" => in_struct_map = true,
                b"div" if in_struct_map => {
                    div_level += 1;
                    if div_level == 2 {
                        page = Some(PendingPage {
                            order_raw: attr_value(&e, b"ORDER")?,
                            fileids: Vec::new(),
                        });
                    }
                }
                b"fptr" if div_level == 2 => {
                    if let Some(p) = page.as_mut() {
                        if let Some(id) = attr_value(&e, b"FILEID")? {
                            p.fileids.push(id);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"fptr" if div_level == 2 => {
                    if let Some(p) = page.as_mut() {
                        if let Some(id) = attr_value(&e, b"FILEID")? {
                            p.fileids.push(id);
                        }
                    }
                }
                // a self-closing page div opens and closes in one event;
                // it necessarily has zero fptr children
                b"div" if in_struct_map && div_level == 1 => {
                    let empty = PendingPage {
                        order_raw: attr_value(&e, b"ORDER")?,
                        fileids: Vec::new(),
                    };
                    let (id, order) = finish_page(empty, pattern)?;
                    keys.insert(id.group_key.clone());
                    items.push(FileDescriptor {
                        order,
                        filename: format!("{}{}", id.payload(), extension),
                        seq: id.seq,
                    });
                }
                _ => {}
            },
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"structMap" => in_struct_map = false,
                b"div" if in_struct_map => {
                    if div_level == 2 {
                        if let Some(p) = page.take() {
                            let (id, order) = finish_page(p, pattern)?;
                            keys.insert(id.group_key.clone());
                            items.push(FileDescriptor {
                                order,
                                filename: format!("{}{}", id.payload(), extension),
                                seq: id.seq,
                            });
                        }
                    }
                    div_level = div_level.saturating_sub(1);
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ReseqrError::Xml(e.to_string()).into()),
            _ => {}
        }
        buf.clear();
    }

    if items.is_empty() {
        return Err(ReseqrError::EmptyDocument.into());
    }
    if keys.len() != 1 {
        return Err(ReseqrError::MixedGroupKeys {
            keys: keys.into_iter().collect(),
        }
        .into());
    }
    let key = keys.into_iter().next().unwrap();
    Ok(MetadataGroup { key, items })
}

pub fn parse_mets_file(
    path: &Path,
    pattern: &FileIdPattern,
    extension: &str,
) -> Result<MetadataGroup> {
    let xml = std::fs::read_to_string(path)?;
    parse_mets_str(&xml, pattern, extension)
}

/// Read every `.xml` document under `mets_dir` (sorted by name) and build
/// the batch-wide group mapping. Zero documents and duplicate group keys
/// across documents are both fatal.
pub fn read_batch_mets(
    mets_dir: &Path,
    pattern: &FileIdPattern,
    extension: &str,
) -> Result<(BTreeMap<String, MetadataGroup>, Vec<MetsDocumentSummary>)> {
    if !mets_dir.is_dir() {
        return Err(ReseqrError::MetsDirNotFound(mets_dir.to_path_buf()).into());
    }

    let mut docs: Vec<PathBuf> = std::fs::read_dir(mets_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file() && p.extension().map(|ext| ext == "xml").unwrap_or(false)
        })
        .collect();
    docs.sort();

    if docs.is_empty() {
        return Err(ReseqrError::NoMetsDocuments(mets_dir.to_path_buf()).into());
    }

    let mut groups: BTreeMap<String, MetadataGroup> = BTreeMap::new();
    let mut summaries = Vec::new();
    for doc in docs {
        let group = parse_mets_file(&doc, pattern, extension)?;
        let name = doc
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        summaries.push(MetsDocumentSummary {
            document: name.clone(),
            group_key: group.key.clone(),
            items: group.items.len(),
        });
        if let Some(prev) = groups.insert(group.key.clone(), group) {
            return Err(ReseqrError::DuplicateGroupKey {
                key: prev.key,
                document: name,
            }
            .into());
        }
    }

    Ok((groups, summaries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const PREFIX: &str = "FIMG-JP2-";

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<METS:mets xmlns:METS="http://www.loc.gov/METS/">
  <METS:structMap>
    <METS:div DMDID="C0" TYPE="CITATION">
      <METS:div ORDER="1" LABEL="Hooker, Joseph D. June 12, 1873 [1]" TYPE="PAGE">
        <METS:fptr FILEID="FIMG-JP2-GenA_0001"/>
      </METS:div>
      <METS:div ORDER="2" LABEL="[2]" TYPE="PAGE">
        <METS:fptr FILEID="FIMG-JP2-GenA_0002"/>
      </METS:div>
    </METS:div>
  </METS:structMap>
</METS:mets>
"#;

    fn pattern() -> FileIdPattern {
        FileIdPattern::new(PREFIX)
    }

    #[test]
    fn parses_pages_in_document_order() {
        let group = parse_mets_str(SAMPLE, &pattern(), ".jp2").unwrap();
        assert_eq!(group.key, "GenA");
        assert_eq!(group.items.len(), 2);
        assert_eq!(group.items[0].order, 1);
        assert_eq!(group.items[0].filename, "GenA_0001.jp2");
        assert_eq!(group.items[0].seq, "0001");
        assert_eq!(group.items[1].filename, "GenA_0002.jp2");
    }

    #[test]
    fn fileid_round_trips_through_pattern() {
        for raw in ["FIMG-JP2-GenA_0001", "FIMG-JP2-Gen_A_007", "FIMG-JP2-x1_0"] {
            let id = pattern().parse(raw).unwrap();
            assert_eq!(format!("{PREFIX}{}", id.payload()), raw);
        }
    }

    #[test]
    fn seq_keeps_leading_zeros() {
        let id = pattern().parse("FIMG-JP2-GenA_0042").unwrap();
        assert_eq!(id.seq, "0042");
        assert_eq!(id.group_key, "GenA");
    }

    #[test]
    fn rejects_unmatched_fileid() {
        assert!(pattern().parse("OTHER-GenA_0001").is_none());
        assert!(pattern().parse("FIMG-JP2-GenA-0001").is_none());
        assert!(pattern().parse("FIMG-JP2-GenA_0001.jp2").is_none());

        let xml = SAMPLE.replace("FIMG-JP2-GenA_0002", "BOGUS");
        let err = parse_mets_str(&xml, &pattern(), ".jp2").unwrap_err();
        assert!(err.to_string().contains("BOGUS"), "got: {err}");
    }

    #[test]
    fn rejects_missing_fptr() {
        let xml = SAMPLE.replace(r#"<METS:fptr FILEID="FIMG-JP2-GenA_0002"/>"#, "");
        let err = parse_mets_str(&xml, &pattern(), ".jp2").unwrap_err();
        assert!(err.to_string().contains("ORDER=2"), "got: {err}");
    }

    #[test]
    fn rejects_self_closing_page_div() {
        let xml = SAMPLE.replace(
            r#"<METS:div ORDER="2" LABEL="[2]" TYPE="PAGE">
        <METS:fptr FILEID="FIMG-JP2-GenA_0002"/>
      </METS:div>"#,
            r#"<METS:div ORDER="2" LABEL="[2]" TYPE="PAGE"/>"#,
        );
        assert!(xml.len() < SAMPLE.len(), "replacement must apply");
        let err = parse_mets_str(&xml, &pattern(), ".jp2").unwrap_err();
        assert!(err.to_string().contains("has 0 fptr"), "got: {err}");
        assert!(err.to_string().contains("ORDER=2"), "got: {err}");
    }

    #[test]
    fn rejects_multiple_fptrs() {
        let xml = SAMPLE.replace(
            r#"<METS:fptr FILEID="FIMG-JP2-GenA_0001"/>"#,
            r#"<METS:fptr FILEID="FIMG-JP2-GenA_0001"/><METS:fptr FILEID="FIMG-JP2-GenA_0003"/>"#,
        );
        let err = parse_mets_str(&xml, &pattern(), ".jp2").unwrap_err();
        assert!(err.to_string().contains("2 fptr"), "got: {err}");
    }

    #[test]
    fn rejects_mixed_group_keys() {
        let xml = SAMPLE.replace("FIMG-JP2-GenA_0002", "FIMG-JP2-GenB_0002");
        let err = parse_mets_str(&xml, &pattern(), ".jp2").unwrap_err();
        assert!(err.to_string().contains("multiple FILEID group keys"), "got: {err}");
    }

    #[test]
    fn rejects_missing_order() {
        let xml = SAMPLE.replace(r#"ORDER="2" "#, "");
        let err = parse_mets_str(&xml, &pattern(), ".jp2").unwrap_err();
        assert!(err.to_string().contains("no ORDER"), "got: {err}");
    }

    #[test]
    fn rejects_bad_order() {
        let xml = SAMPLE.replace(r#"ORDER="2""#, r#"ORDER="zero""#);
        assert!(parse_mets_str(&xml, &pattern(), ".jp2").is_err());
        let xml = SAMPLE.replace(r#"ORDER="2""#, r#"ORDER="0""#);
        assert!(parse_mets_str(&xml, &pattern(), ".jp2").is_err());
    }

    #[test]
    fn rejects_empty_document() {
        let xml = r#"<mets xmlns="http://www.loc.gov/METS/"><structMap/></mets>"#;
        assert!(parse_mets_str(xml, &pattern(), ".jp2").is_err());
    }

    #[test]
    fn batch_aggregation_sorts_and_rejects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.xml"), SAMPLE).unwrap();
        fs::write(
            dir.path().join("a.xml"),
            SAMPLE.replace("GenA", "GenB"),
        )
        .unwrap();

        let (groups, summaries) = read_batch_mets(dir.path(), &pattern(), ".jp2").unwrap();
        assert_eq!(groups.len(), 2);
        assert!(groups.contains_key("GenA") && groups.contains_key("GenB"));
        // documents are visited sorted by file name
        assert_eq!(summaries[0].document, "a.xml");
        assert_eq!(summaries[0].group_key, "GenB");

        fs::write(dir.path().join("c.xml"), SAMPLE).unwrap();
        let err = read_batch_mets(dir.path(), &pattern(), ".jp2").unwrap_err();
        assert!(err.to_string().contains("already provided"), "got: {err}");
    }

    #[test]
    fn batch_aggregation_requires_documents() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_batch_mets(dir.path(), &pattern(), ".jp2").unwrap_err();
        assert!(err.to_string().contains("no METS documents"), "got: {err}");

        let missing = dir.path().join("nope");
        let err = read_batch_mets(&missing, &pattern(), ".jp2").unwrap_err();
        assert!(err.to_string().contains("not found"), "got: {err}");
    }
}
