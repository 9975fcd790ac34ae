//! Label descriptor documents (`DieCutLabel` XML)
//!
//! A descriptor describes exactly one physical label for a label-printer
//! driver. Element order, names and fixed values follow the driver schema;
//! bounds are twips and come from the layout, never from content length.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::borrow::Cow;

use crate::error::{PrintError, PrintResult};

/// MIME type of `.label` files
pub const DESCRIPTOR_MIME: &str = "text/xml";

/// File extension of descriptor documents
pub const DESCRIPTOR_EXT: &str = "label";

/// Escape the five XML metacharacters (`<`, `>`, `&`, `'`, `"`)
pub fn escape_xml(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

/// Rectangle in twips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Whether two rectangles share any area
    pub const fn overlaps(&self, other: &Bounds) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Rounded-rectangle label outline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundRect {
    pub bounds: Bounds,
    pub rx: u32,
    pub ry: u32,
}

/// ARGB color channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argb {
    pub alpha: u8,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Argb {
    pub const BLACK: Argb = Argb {
        alpha: 255,
        red: 0,
        green: 0,
        blue: 0,
    };

    pub const TRANSPARENT_WHITE: Argb = Argb {
        alpha: 0,
        red: 255,
        green: 255,
        blue: 255,
    };
}

/// Font family, point size, weight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSpec {
    pub family: String,
    pub size: u32,
    pub bold: bool,
}

impl FontSpec {
    pub fn arial(size: u32, bold: bool) -> Self {
        Self {
            family: "Arial".into(),
            size,
            bold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAlignment {
    Left,
    Center,
}

impl HorizontalAlignment {
    fn as_str(self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Center => "Center",
        }
    }
}

/// Styled text block
#[derive(Debug, Clone, PartialEq)]
pub struct TextObject {
    pub name: String,
    pub text: String,
    pub font: FontSpec,
    pub align: HorizontalAlignment,
    pub bounds: Bounds,
}

/// Printer-rendered barcode
#[derive(Debug, Clone, PartialEq)]
pub struct BarcodeObject {
    pub name: String,
    pub text: String,
    /// Symbology name understood by the driver (e.g. `Code128Auto`)
    pub barcode_type: String,
    pub show_text: bool,
    pub font: FontSpec,
    pub bar_height: u32,
    pub bar_width: u32,
    pub bounds: Bounds,
}

/// One physical die-cut label
#[derive(Debug, Clone, PartialEq)]
pub struct LabelDescriptor {
    pub id: String,
    pub paper_name: String,
    pub landscape: bool,
    pub outline: RoundRect,
    pub text_objects: Vec<TextObject>,
    pub barcode: BarcodeObject,
}

impl LabelDescriptor {
    /// Text block by object name
    pub fn text_object(&self, name: &str) -> Option<&TextObject> {
        self.text_objects.iter().find(|t| t.name == name)
    }

    /// Serialize to the driver's XML schema
    pub fn to_xml(&self) -> PrintResult<String> {
        let mut out = XmlOut::new();

        out.event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        out.start(
            "DieCutLabel",
            &[("Version", "8.0"), ("Units", "twips"), ("MediaType", "Default")],
        )?;
        out.leaf(
            "PaperOrientation",
            if self.landscape { "Landscape" } else { "Portrait" },
        )?;
        out.leaf("Id", &self.id)?;
        out.leaf("IsOutlined", "false")?;
        out.leaf("PaperName", &self.paper_name)?;

        out.start("DrawCommands", &[])?;
        let o = &self.outline;
        out.empty(
            "RoundRectangle",
            &[
                ("X", o.bounds.x.to_string().as_str()),
                ("Y", o.bounds.y.to_string().as_str()),
                ("Width", o.bounds.width.to_string().as_str()),
                ("Height", o.bounds.height.to_string().as_str()),
                ("Rx", o.rx.to_string().as_str()),
                ("Ry", o.ry.to_string().as_str()),
            ],
        )?;
        out.end("DrawCommands")?;

        for text in &self.text_objects {
            out.start("ObjectInfo", &[])?;
            write_text_object(&mut out, text)?;
            out.bounds(&text.bounds)?;
            out.end("ObjectInfo")?;
        }

        out.start("ObjectInfo", &[])?;
        write_barcode_object(&mut out, &self.barcode)?;
        out.bounds(&self.barcode.bounds)?;
        out.end("ObjectInfo")?;

        out.end("DieCutLabel")?;
        out.finish()
    }
}

fn write_object_header(out: &mut XmlOut, name: &str) -> PrintResult<()> {
    out.leaf("Name", name)?;
    out.color("ForeColor", Argb::BLACK, false)?;
    out.color("BackColor", Argb::TRANSPARENT_WHITE, false)?;
    out.empty("LinkedObjectName", &[])?;
    out.leaf("Rotation", "Rotation0")?;
    out.leaf("IsMirrored", "False")?;
    out.leaf("IsVariable", "False")?;
    out.leaf("GroupID", "-1")?;
    out.leaf("IsOutlined", "False")
}

fn write_text_object(out: &mut XmlOut, text: &TextObject) -> PrintResult<()> {
    out.start("TextObject", &[])?;
    write_object_header(out, &text.name)?;
    out.leaf("HorizontalAlignment", text.align.as_str())?;
    out.leaf("VerticalAlignment", "Top")?;
    out.leaf("TextFitMode", "ShrinkToFit")?;
    out.leaf("UseFullFontHeight", "True")?;
    out.leaf("Verticalized", "False")?;

    out.start("StyledText", &[])?;
    out.start("Element", &[])?;
    out.start("String", &[("xml:space", "preserve")])?;
    out.text(&text.text)?;
    out.end("String")?;
    out.start("Attributes", &[])?;
    out.font("Font", &text.font)?;
    out.color("ForeColor", Argb::BLACK, true)?;
    out.end("Attributes")?;
    out.end("Element")?;
    out.end("StyledText")?;

    out.end("TextObject")
}

fn write_barcode_object(out: &mut XmlOut, barcode: &BarcodeObject) -> PrintResult<()> {
    out.start("BarcodeObject", &[])?;
    write_object_header(out, &barcode.name)?;
    out.leaf("Text", &barcode.text)?;
    out.leaf("Type", &barcode.barcode_type)?;
    out.leaf("ShowText", bool_str(barcode.show_text))?;
    out.leaf("CheckSum", "False")?;
    out.leaf("TextPosition", "Bottom")?;
    out.font("TextFont", &barcode.font)?;
    out.font("CheckSumFont", &barcode.font)?;
    out.color("TextColor", Argb::BLACK, true)?;
    out.color("CheckSumColor", Argb::BLACK, true)?;
    out.leaf("BarHeight", barcode.bar_height.to_string().as_str())?;
    out.leaf("BarWidth", barcode.bar_width.to_string().as_str())?;
    out.end("BarcodeObject")
}

fn bool_str(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

fn xml_err(e: impl std::fmt::Display) -> PrintError {
    PrintError::Descriptor(e.to_string())
}

/// Thin event writer with indentation
struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 4),
        }
    }

    fn event(&mut self, event: Event<'_>) -> PrintResult<()> {
        self.writer.write_event(event).map_err(xml_err)
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> PrintResult<()> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.event(Event::Start(start))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> PrintResult<()> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.event(Event::Empty(start))
    }

    fn end(&mut self, name: &str) -> PrintResult<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text(&mut self, text: &str) -> PrintResult<()> {
        self.event(Event::Text(BytesText::from_escaped(escape_xml(text))))
    }

    fn leaf(&mut self, name: &str, text: &str) -> PrintResult<()> {
        self.start(name, &[])?;
        self.text(text)?;
        self.end(name)
    }

    fn bounds(&mut self, b: &Bounds) -> PrintResult<()> {
        self.empty(
            "Bounds",
            &[
                ("X", b.x.to_string().as_str()),
                ("Y", b.y.to_string().as_str()),
                ("Width", b.width.to_string().as_str()),
                ("Height", b.height.to_string().as_str()),
            ],
        )
    }

    fn font(&mut self, name: &str, font: &FontSpec) -> PrintResult<()> {
        self.empty(
            name,
            &[
                ("Family", font.family.as_str()),
                ("Size", font.size.to_string().as_str()),
                ("Bold", bool_str(font.bold)),
                ("Italic", "False"),
                ("Underline", "False"),
                ("Strikeout", "False"),
            ],
        )
    }

    fn color(&mut self, name: &str, c: Argb, hue_scale: bool) -> PrintResult<()> {
        let alpha = c.alpha.to_string();
        let red = c.red.to_string();
        let green = c.green.to_string();
        let blue = c.blue.to_string();
        let mut attrs = vec![
            ("Alpha", alpha.as_str()),
            ("Red", red.as_str()),
            ("Green", green.as_str()),
            ("Blue", blue.as_str()),
        ];
        if hue_scale {
            attrs.push(("HueScale", "100"));
        }
        self.empty(name, &attrs)
    }

    fn finish(self) -> PrintResult<String> {
        String::from_utf8(self.writer.into_inner()).map_err(xml_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::Reader;

    fn descriptor(text: &str) -> LabelDescriptor {
        LabelDescriptor {
            id: "RxLabel".into(),
            paper_name: "30252 Address".into(),
            landscape: true,
            outline: RoundRect {
                bounds: Bounds::new(0, 0, 5760, 3240),
                rx: 270,
                ry: 270,
            },
            text_objects: vec![TextObject {
                name: "DrugInfo".into(),
                text: text.into(),
                font: FontSpec::arial(12, true),
                align: HorizontalAlignment::Left,
                bounds: Bounds::new(144, 1008, 3600, 432),
            }],
            barcode: BarcodeObject {
                name: "RxBarcode".into(),
                text: "1000000".into(),
                barcode_type: "Code128Auto".into(),
                show_text: true,
                font: FontSpec::arial(8, false),
                bar_height: 576,
                bar_width: 2,
                bounds: Bounds::new(3888, 1440, 1584, 720),
            },
        }
    }

    /// Text content of every `<String>` element, unescaped
    fn parse_strings(xml: &str) -> Vec<String> {
        let mut reader = Reader::from_str(xml);
        let mut inside = false;
        let mut found = Vec::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) if e.name().as_ref() == b"String" => inside = true,
                Event::End(e) if e.name().as_ref() == b"String" => inside = false,
                Event::Text(t) if inside => found.push(t.unescape().unwrap().into_owned()),
                Event::Eof => break,
                _ => {}
            }
        }
        found
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml(r#"<a & 'b' "c">"#), "&lt;a &amp; &apos;b&apos; &quot;c&quot;&gt;");
        assert_eq!(escape_xml("plain"), "plain");
    }

    #[test]
    fn test_escape_roundtrip_through_parser() {
        let original = "Tom & Jerry's <\"Pharmacy\">\nRX#: 1000000";
        let xml = descriptor(original).to_xml().unwrap();
        assert!(!xml.contains("Tom & Jerry"));
        assert_eq!(parse_strings(&xml), vec![original.to_string()]);
    }

    #[test]
    fn test_schema_fragments() {
        let xml = descriptor("x").to_xml().unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="utf-8"?>"#));
        assert!(xml.contains(r#"<DieCutLabel Version="8.0" Units="twips" MediaType="Default">"#));
        assert!(xml.contains("<PaperOrientation>Landscape</PaperOrientation>"));
        assert!(xml.contains(r#"<RoundRectangle X="0" Y="0" Width="5760" Height="3240" Rx="270" Ry="270"/>"#));
        assert!(xml.contains("<Name>DrugInfo</Name>"));
        assert!(xml.contains(r#"<Bounds X="144" Y="1008" Width="3600" Height="432"/>"#));
        assert!(xml.contains(r#"<Font Family="Arial" Size="12" Bold="True" Italic="False" Underline="False" Strikeout="False"/>"#));
        assert!(xml.contains("<Type>Code128Auto</Type>"));
        assert!(xml.contains("<BarHeight>576</BarHeight>"));
        assert!(xml.contains(r#"<Bounds X="3888" Y="1440" Width="1584" Height="720"/>"#));
        assert!(xml.trim_end().ends_with("</DieCutLabel>"));
    }

    #[test]
    fn test_bounds_overlap() {
        let info = Bounds::new(144, 1872, 3600, 1224);
        let barcode = Bounds::new(3888, 1440, 1584, 720);
        assert!(!info.overlaps(&barcode));
        assert!(info.overlaps(&Bounds::new(3000, 2000, 100, 100)));
    }
}
