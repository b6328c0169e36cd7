//! Parser for Qt Linguist `.ts` translation sources.
//!
//! Walks the XML event stream with an explicit element stack. Each open
//! element is a [`Frame`]; text-bearing frames accumulate their content and
//! hand it to the parent frame when they close.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use crate::catalog::{Catalog, Entry, Header, Location, Status};
use crate::error::I18nError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Source,
    Comment,
    NumerusForm,
}

#[derive(Debug, Default)]
struct PendingMessage {
    source: Option<String>,
    comment: Option<String>,
    translation: Option<String>,
    forms: Vec<String>,
    status: Status,
    unfinished: bool,
    utf8: bool,
    location: Option<Location>,
}

impl PendingMessage {
    fn into_entry(self, context: &str, position: u64) -> Result<Entry, I18nError> {
        let source = self.source.ok_or_else(|| {
            I18nError::malformed(
                position,
                format!("message in context `{context}` has no <source>"),
            )
        })?;
        let translation = if self.forms.is_empty() {
            self.translation.unwrap_or_default()
        } else {
            String::new()
        };
        let mut entry = Entry::new(context, source, translation)
            .with_status(self.status)
            .with_unfinished(self.unfinished)
            .with_utf8(self.utf8)
            .with_comment(self.comment.unwrap_or_default());
        if let Some(location) = self.location {
            entry = entry.with_location(location);
        }
        if !self.forms.is_empty() {
            entry = entry.with_numerus_forms(self.forms);
        }
        Ok(entry)
    }
}

#[derive(Debug)]
enum Frame {
    Root,
    Context(Option<String>),
    Message(Box<PendingMessage>),
    Translation { text: String, forms: Vec<String> },
    Field(Field, String),
    Skipped,
}

#[derive(Debug, Default)]
struct Parser {
    catalog: Option<Catalog>,
    stack: Vec<Frame>,
    closed_root: bool,
}

impl Parser {
    fn open(&mut self, e: &BytesStart<'_>, pos: u64) -> Result<(), I18nError> {
        let qname = e.name();
        let name = qname.as_ref();

        let frame = match self.stack.last_mut() {
            None => {
                if self.catalog.is_some() || self.closed_root {
                    return Err(I18nError::malformed(pos, "more than one root element"));
                }
                if name != b"TS" {
                    return Err(I18nError::malformed(
                        pos,
                        format!(
                            "expected <TS> root element, found <{}>",
                            String::from_utf8_lossy(name)
                        ),
                    ));
                }
                let header = Header {
                    version: attribute(e, b"version", pos)?,
                    language: attribute(e, b"language", pos)?,
                    source_language: attribute(e, b"sourcelanguage", pos)?,
                };
                self.catalog = Some(Catalog::new(header));
                Frame::Root
            }
            Some(Frame::Root) => match name {
                b"context" => Frame::Context(None),
                b"message" => {
                    return Err(I18nError::malformed(pos, "<message> outside of a <context>"));
                }
                _ => Frame::Skipped,
            },
            Some(Frame::Context(_)) => match name {
                b"name" => Frame::Field(Field::Name, String::new()),
                b"message" => Frame::Message(Box::new(message_attributes(e, pos)?)),
                _ => Frame::Skipped,
            },
            Some(Frame::Message(message)) => match name {
                b"location" => {
                    // lupdate may list several; the first is kept
                    if message.location.is_none() {
                        message.location = Some(location(e, pos)?);
                    }
                    Frame::Skipped
                }
                b"source" => Frame::Field(Field::Source, String::new()),
                b"comment" => Frame::Field(Field::Comment, String::new()),
                b"translation" => {
                    let (status, unfinished) = translation_type(e, pos)?;
                    message.status = status;
                    message.unfinished = unfinished;
                    Frame::Translation {
                        text: String::new(),
                        forms: Vec::new(),
                    }
                }
                _ => Frame::Skipped,
            },
            Some(Frame::Translation { text, .. }) => match name {
                b"numerusform" => Frame::Field(Field::NumerusForm, String::new()),
                b"byte" => {
                    text.push(byte_value(e, pos)?);
                    Frame::Skipped
                }
                _ => Frame::Skipped,
            },
            Some(Frame::Field(_, text)) => {
                if name == b"byte" {
                    text.push(byte_value(e, pos)?);
                }
                Frame::Skipped
            }
            Some(Frame::Skipped) => Frame::Skipped,
        };

        self.stack.push(frame);
        Ok(())
    }

    fn close(&mut self, pos: u64) -> Result<(), I18nError> {
        let Some(frame) = self.stack.pop() else {
            return Err(I18nError::malformed(pos, "closing tag without an open element"));
        };

        match frame {
            Frame::Field(field, text) => match (field, self.stack.last_mut()) {
                (Field::Name, Some(Frame::Context(name))) => {
                    if let Some(catalog) = self.catalog.as_mut() {
                        catalog.ensure_context(&text);
                    }
                    *name = Some(text);
                }
                (Field::Source, Some(Frame::Message(message))) => message.source = Some(text),
                (Field::Comment, Some(Frame::Message(message))) => message.comment = Some(text),
                (Field::NumerusForm, Some(Frame::Translation { forms, .. })) => forms.push(text),
                _ => {}
            },
            Frame::Translation { text, forms } => {
                if let Some(Frame::Message(message)) = self.stack.last_mut() {
                    message.translation = Some(text);
                    message.forms = forms;
                }
            }
            Frame::Message(message) => {
                let context = match self.stack.last() {
                    Some(Frame::Context(Some(name))) => name.as_str(),
                    _ => {
                        return Err(I18nError::malformed(
                            pos,
                            "<message> appears before its context <name>",
                        ));
                    }
                };
                let entry = message.into_entry(context, pos)?;
                if let Some(catalog) = self.catalog.as_mut() {
                    catalog.push(entry);
                }
            }
            Frame::Context(name) => {
                if name.is_none() {
                    return Err(I18nError::malformed(pos, "<context> without a <name>"));
                }
            }
            Frame::Root => self.closed_root = true,
            Frame::Skipped => {}
        }
        Ok(())
    }

    fn wants_text(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(Frame::Field(..) | Frame::Translation { .. })
        )
    }

    fn push_text(&mut self, chunk: &str) {
        match self.stack.last_mut() {
            Some(Frame::Field(_, text) | Frame::Translation { text, .. }) => text.push_str(chunk),
            _ => {}
        }
    }

    fn finish(self, pos: u64) -> Result<Catalog, I18nError> {
        if !self.stack.is_empty() {
            return Err(I18nError::malformed(
                pos,
                format!(
                    "unexpected end of input with {} unclosed element(s)",
                    self.stack.len()
                ),
            ));
        }
        self.catalog
            .ok_or_else(|| I18nError::malformed(pos, "missing <TS> root element"))
    }
}

/// Parse a complete `.ts` document.
pub(crate) fn parse(input: &str) -> Result<Catalog, I18nError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut reader = Reader::from_str(input);
    let mut parser = Parser::default();

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                return Err(I18nError::malformed(
                    reader.buffer_position(),
                    err.to_string(),
                ));
            }
        };
        let pos = reader.buffer_position();

        match event {
            Event::Start(e) => parser.open(&e, pos)?,
            Event::Empty(e) => {
                parser.open(&e, pos)?;
                parser.close(pos)?;
            }
            Event::End(_) => parser.close(pos)?,
            Event::Text(t) => {
                if parser.wants_text() {
                    let raw = std::str::from_utf8(&t)
                        .map_err(|err| I18nError::malformed(pos, err.to_string()))?;
                    // Line ends are normalized before references are expanded,
                    // so `&#13;` still yields a carriage return.
                    let text = unescape(&normalize_line_ends(raw))
                        .map_err(|err| I18nError::malformed(pos, err.to_string()))?
                        .into_owned();
                    parser.push_text(&text);
                }
            }
            Event::CData(c) => {
                if parser.wants_text() {
                    let text = std::str::from_utf8(&c)
                        .map_err(|err| I18nError::malformed(pos, err.to_string()))?;
                    parser.push_text(&normalize_line_ends(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let catalog = parser.finish(reader.buffer_position())?;
    debug!(
        language = catalog.language().unwrap_or(""),
        contexts = catalog.contexts().count(),
        entries = catalog.len(),
        "parsed translation source"
    );
    Ok(catalog)
}

/// Map `\r\n` and lone `\r` to `\n`, as XML requires of literal text.
fn normalize_line_ends(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

fn attribute(e: &BytesStart<'_>, key: &[u8], pos: u64) -> Result<Option<String>, I18nError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| I18nError::malformed(pos, err.to_string()))?;
        if attr.key.as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|err| I18nError::malformed(pos, err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn message_attributes(e: &BytesStart<'_>, pos: u64) -> Result<PendingMessage, I18nError> {
    let utf8 = attribute(e, b"utf8", pos)?.is_some_and(|v| v == "true")
        || attribute(e, b"encoding", pos)?.is_some_and(|v| v.eq_ignore_ascii_case("UTF-8"));
    Ok(PendingMessage {
        utf8,
        ..PendingMessage::default()
    })
}

fn translation_type(e: &BytesStart<'_>, pos: u64) -> Result<(Status, bool), I18nError> {
    match attribute(e, b"type", pos)?.as_deref() {
        None | Some("") => Ok((Status::Active, false)),
        Some("unfinished") => Ok((Status::Active, true)),
        Some("obsolete" | "vanished") => Ok((Status::Obsolete, false)),
        Some(other) => Err(I18nError::malformed(
            pos,
            format!("unknown translation type `{other}`"),
        )),
    }
}

fn location(e: &BytesStart<'_>, pos: u64) -> Result<Location, I18nError> {
    let file = attribute(e, b"filename", pos)?.unwrap_or_default();
    let line = match attribute(e, b"line", pos)? {
        None => None,
        Some(raw) => Some(
            raw.trim_start_matches('+')
                .parse::<u32>()
                .map_err(|_| I18nError::malformed(pos, format!("invalid location line `{raw}`")))?,
        ),
    };
    Ok(Location { file, line })
}

/// Decode `<byte value="x0A"/>`, which encodes characters XML cannot carry.
fn byte_value(e: &BytesStart<'_>, pos: u64) -> Result<char, I18nError> {
    let raw = attribute(e, b"value", pos)?.unwrap_or_default();
    let code = match raw.strip_prefix('x') {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => raw.parse::<u32>().ok(),
    };
    code.and_then(char::from_u32)
        .ok_or_else(|| I18nError::malformed(pos, format!("invalid byte value `{raw}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.0" language="zh">
<context>
    <name>Editor</name>
    <message>
        <location filename="ui/editor.py" line="36"/>
        <source>New Diary</source>
        <translation>新的日记</translation>
    </message>
    <message>
        <location filename="Hazama.py" line="402"/>
        <source>Created: %s
Modified: %s</source>
        <translation type="obsolete">创建时间: %s
修改时间: %s</translation>
    </message>
</context>
<context>
    <name>Settings</name>
    <message>
        <location filename="ui/configdialog_ui.py" line="161"/>
        <source>English</source>
        <translation></translation>
    </message>
    <message utf8="true">
        <location filename="ui/configdialog_ui.py" line="162"/>
        <source>简体中文</source>
        <translation></translation>
    </message>
</context>
</TS>
"#;

    #[test]
    fn parses_header() {
        let catalog = parse(SAMPLE).unwrap();
        assert_eq!(catalog.version(), Some("2.0"));
        assert_eq!(catalog.language(), Some("zh"));
        assert_eq!(catalog.source_language(), None);
    }

    #[test]
    fn parses_contexts_and_entries() {
        let catalog = parse(SAMPLE).unwrap();
        let names: Vec<&str> = catalog.contexts().map(|c| c.name()).collect();
        assert_eq!(names, vec!["Editor", "Settings"]);
        assert_eq!(catalog.len(), 4);

        let editor = catalog.context("Editor").unwrap();
        let first = &editor.entries()[0];
        assert_eq!(first.source(), "New Diary");
        assert_eq!(first.translation(), "新的日记");
        assert_eq!(
            first.location(),
            Some(&Location {
                file: "ui/editor.py".into(),
                line: Some(36),
            })
        );
    }

    #[test]
    fn multiline_source_is_preserved() {
        let catalog = parse(SAMPLE).unwrap();
        let editor = catalog.context("Editor").unwrap();
        let entry = &editor.entries()[1];
        assert_eq!(entry.source(), "Created: %s\nModified: %s");
        assert_eq!(entry.translation(), "创建时间: %s\n修改时间: %s");
        assert_eq!(entry.status(), Status::Obsolete);
    }

    #[test]
    fn utf8_marker_and_empty_translation() {
        let catalog = parse(SAMPLE).unwrap();
        let settings = catalog.context("Settings").unwrap();
        assert!(!settings.entries()[0].is_utf8());
        assert!(settings.entries()[1].is_utf8());
        assert_eq!(catalog.lookup("Settings", "English"), "");
        assert_eq!(catalog.lookup("Settings", "简体中文"), "");
    }

    #[test]
    fn entities_are_unescaped() {
        let catalog = parse(
            r#"<TS version="2.1" language="zh_CN" sourcelanguage="en">
<context><name>Dialog</name>
<message><source>Save &amp; close &lt;now&gt;</source><translation>保存&amp;关闭</translation></message>
<message><source>Line&#10;break</source><translation><![CDATA[<b>粗</b>]]></translation></message>
</context></TS>"#,
        )
        .unwrap();
        assert_eq!(catalog.source_language(), Some("en"));
        assert_eq!(catalog.lookup("Dialog", "Save & close <now>"), "保存&关闭");
        assert_eq!(catalog.lookup("Dialog", "Line\nbreak"), "<b>粗</b>");
    }

    #[test]
    fn byte_elements_are_decoded() {
        let catalog = parse(
            r#"<TS version="2.1" language="zh">
<context><name>Main</name>
<message><source>Bell<byte value="x7"/></source><translation>铃<byte value="7"/></translation></message>
</context></TS>"#,
        )
        .unwrap();
        assert_eq!(catalog.lookup("Main", "Bell\u{7}"), "铃\u{7}");
    }

    #[test]
    fn translation_types() {
        let catalog = parse(
            r#"<TS version="2.1" language="zh">
<context><name>Main</name>
<message><source>a</source><translation type="vanished">甲</translation></message>
<message><source>b</source><translation type="unfinished">乙</translation></message>
<message><source>c</source></message>
</context></TS>"#,
        )
        .unwrap();
        let main = catalog.context("Main").unwrap();
        assert_eq!(main.entries()[0].status(), Status::Obsolete);
        assert!(main.entries()[1].is_active());
        assert!(main.entries()[1].is_unfinished());
        assert_eq!(catalog.lookup("Main", "a"), "a");
        assert_eq!(catalog.lookup("Main", "b"), "乙");
        // No <translation> element at all: stored empty
        assert_eq!(catalog.find("Main", "c"), Some(""));
    }

    #[test]
    fn numerus_forms() {
        let catalog = parse(
            r#"<TS version="2.1" language="ru">
<context><name>NList</name>
<message numerus="yes">
    <source>%n diaries</source>
    <translation>
        <numerusform>%n дневник</numerusform>
        <numerusform>%n дневника</numerusform>
        <numerusform>%n дневников</numerusform>
    </translation>
</message>
</context></TS>"#,
        )
        .unwrap();
        let entry = &catalog.context("NList").unwrap().entries()[0];
        assert_eq!(entry.numerus_forms().len(), 3);
        assert_eq!(entry.translation(), "%n дневник");
        assert_eq!(catalog.lookup_numerus("NList", "%n diaries", 21), "%n дневник");
        assert_eq!(catalog.lookup_numerus("NList", "%n diaries", 3), "%n дневника");
        assert_eq!(catalog.lookup_numerus("NList", "%n diaries", 11), "%n дневников");
    }

    #[test]
    fn comments_and_ignored_elements() {
        let catalog = parse(
            r#"<TS version="2.1" language="zh">
<context><name>Main</name>
<message>
    <source>Open</source>
    <comment>toggle</comment>
    <extracomment>shown in the tray menu</extracomment>
    <translatorcomment>check wording</translatorcomment>
    <translation>开启</translation>
</message>
</context></TS>"#,
        )
        .unwrap();
        let entry = &catalog.context("Main").unwrap().entries()[0];
        assert_eq!(entry.comment(), Some("toggle"));
        assert_eq!(catalog.lookup_disambiguated("Main", "Open", "toggle"), "开启");
        assert_eq!(catalog.lookup("Main", "Open"), "Open");
    }

    #[test]
    fn first_location_kept() {
        let catalog = parse(
            r#"<TS version="2.1" language="zh">
<context><name>Main</name>
<message>
    <location filename="a.py" line="+3"/>
    <location filename="b.py" line="9"/>
    <source>x</source>
</message>
</context></TS>"#,
        )
        .unwrap();
        let entry = &catalog.context("Main").unwrap().entries()[0];
        let location = entry.location().unwrap();
        assert_eq!(location.file, "a.py");
        assert_eq!(location.line, Some(3));
    }

    #[test]
    fn empty_context_is_listed() {
        let catalog = parse(r#"<TS version="2.0" language="zh"><context><name>Errors</name></context></TS>"#)
            .unwrap();
        assert!(catalog.context("Errors").is_some());
        assert!(catalog.is_empty());
    }

    #[test]
    fn byte_order_mark_is_skipped() {
        let input = format!("\u{feff}{SAMPLE}");
        assert!(parse(&input).is_ok());
    }

    #[test]
    fn crlf_line_ends_are_normalized() {
        let input = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\r\n<TS version=\"2.0\" language=\"zh\">\r\n<context>\r\n    <name>Editor</name>\r\n    <message>\r\n        <source>Created: %s\r\nModified: %s</source>\r\n        <translation>创建：%s\r\n修改：%s</translation>\r\n    </message>\r\n    <message>\r\n        <source>Old\rMac</source>\r\n        <translation><![CDATA[A\r\nB]]></translation>\r\n    </message>\r\n</context>\r\n</TS>\r\n";
        let catalog = parse(input).unwrap();
        assert_eq!(
            catalog.lookup("Editor", "Created: %s\nModified: %s"),
            "创建：%s\n修改：%s"
        );
        assert_eq!(catalog.lookup("Editor", "Old\nMac"), "A\nB");
        assert!(catalog.entries().all(|e| !e.source().contains('\r')));
    }

    #[test]
    fn carriage_return_reference_is_kept() {
        let input = r#"<TS version="2.0"><context><name>Editor</name>
<message><source>a&#13;b</source><translation>x</translation></message>
</context></TS>"#;
        let catalog = parse(input).unwrap();
        assert_eq!(catalog.lookup("Editor", "a\rb"), "x");
    }

    fn reason(input: &str) -> String {
        match parse(input) {
            Err(I18nError::MalformedResource { reason, .. }) => reason,
            other => panic!("expected malformed resource, got {other:?}"),
        }
    }

    #[test]
    fn rejects_wrong_root() {
        assert!(reason("<xliff></xliff>").contains("expected <TS>"));
    }

    #[test]
    fn rejects_missing_root() {
        assert!(reason("").contains("missing <TS>"));
        assert!(reason("<?xml version=\"1.0\"?>").contains("missing <TS>"));
    }

    #[test]
    fn rejects_message_outside_context() {
        assert!(reason("<TS><message><source>x</source></message></TS>").contains("outside"));
    }

    #[test]
    fn rejects_context_without_name() {
        assert!(reason("<TS><context></context></TS>").contains("without a <name>"));
    }

    #[test]
    fn rejects_message_before_name() {
        let input = "<TS><context><message><source>x</source></message><name>A</name></context></TS>";
        assert!(reason(input).contains("before its context"));
    }

    #[test]
    fn rejects_message_without_source() {
        let input = "<TS><context><name>A</name><message><translation>y</translation></message></context></TS>";
        assert!(reason(input).contains("no <source>"));
    }

    #[test]
    fn rejects_unknown_translation_type() {
        let input = r#"<TS><context><name>A</name><message><source>x</source><translation type="draft">y</translation></message></context></TS>"#;
        assert!(reason(input).contains("unknown translation type"));
    }

    #[test]
    fn rejects_bad_location_line() {
        let input = r#"<TS><context><name>A</name><message><location filename="a.py" line="ten"/><source>x</source></message></context></TS>"#;
        assert!(reason(input).contains("invalid location line"));
    }

    #[test]
    fn rejects_truncated_input() {
        let cut = SAMPLE.find("<context>\n    <name>Settings").unwrap();
        assert!(reason(&SAMPLE[..cut]).contains("unclosed"));
    }

    #[test]
    fn rejects_mismatched_tags() {
        assert!(parse("<TS><context><name>A</context></name></TS>").is_err());
    }

    #[test]
    fn rejects_second_root() {
        assert!(parse(r#"<TS version="2.0"></TS><TS version="2.0"></TS>"#).is_err());
    }
}
