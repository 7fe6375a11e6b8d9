use quick_xml::{Reader, events::Event};
use serde_json::{Map, Value};

struct OpenElement {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl OpenElement {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Map::new(),
            text: String::new(),
        }
    }

    fn into_value(self) -> Value {
        if !self.children.is_empty() {
            Value::Object(self.children)
        } else if self.text.is_empty() {
            Value::Null
        } else {
            Value::String(self.text)
        }
    }
}

/// Decodes an XML document into a JSON tree keyed by local element names.
///
/// Attributes and namespace prefixes are dropped, text-only elements become
/// strings, empty elements become null and repeated siblings become arrays.
/// Returns `None` when the document has no root or is cut short.
pub(crate) fn decode_document(xml: &str) -> Result<Option<Value>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                stack.push(OpenElement::new(element_name(start.local_name().as_ref())));
            }
            Event::Empty(empty) => {
                let name = element_name(empty.local_name().as_ref());
                close(&mut stack, &mut root, name, Value::Null);
            }
            Event::Text(text) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(_) => {
                let Some(open) = stack.pop() else {
                    return Ok(None);
                };
                let name = open.name.clone();
                close(&mut stack, &mut root, name, open.into_value());
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Ok(None);
    }
    Ok(root)
}

fn element_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn close(stack: &mut [OpenElement], root: &mut Option<Value>, name: String, value: Value) {
    match stack.last_mut() {
        Some(parent) => insert_child(&mut parent.children, name, value),
        None => {
            let mut document = Map::new();
            document.insert(name, value);
            *root = Some(Value::Object(document));
        }
    }
}

fn insert_child(children: &mut Map<String, Value>, name: String, value: Value) {
    match children.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            children.insert(name, value);
        }
    }
}
