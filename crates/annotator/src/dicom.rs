//! Minimal DICOM Part 10 reader.
//!
//! Only what a single-frame grayscale slice needs is extracted: geometry,
//! bit depth, display window, rescale and the raw 16-bit pixel samples.
//! Implicit and explicit VR little endian are supported; sequences are
//! skipped without being interpreted.

use tracing::debug;

use crate::{
    error::{DecodeError, Result},
    intensity::Rescale,
    traits::SliceDecoder,
    types::{DecodedSlice, Dimensions},
};

const PREAMBLE_LEN: usize = 128;
const PREFIX: &[u8; 4] = b"DICM";

pub const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";
pub const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";

const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;

/// VRs whose explicit encoding carries two reserved bytes and a 32-bit length
const LONG_VRS: [&[u8; 2]; 13] = [
    b"OB", b"OD", b"OF", b"OL", b"OV", b"OW", b"SQ", b"SV", b"UC", b"UN", b"UR", b"UT", b"UV",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tag(u16, u16);

impl Tag {
    const TRANSFER_SYNTAX: Tag = Tag(0x0002, 0x0010);
    const MODALITY: Tag = Tag(0x0008, 0x0060);
    const ROWS: Tag = Tag(0x0028, 0x0010);
    const COLUMNS: Tag = Tag(0x0028, 0x0011);
    const BITS_ALLOCATED: Tag = Tag(0x0028, 0x0100);
    const WINDOW_CENTER: Tag = Tag(0x0028, 0x1050);
    const WINDOW_WIDTH: Tag = Tag(0x0028, 0x1051);
    const RESCALE_INTERCEPT: Tag = Tag(0x0028, 0x1052);
    const RESCALE_SLOPE: Tag = Tag(0x0028, 0x1053);
    const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);
    const ITEM_DELIMITATION: Tag = Tag(0xFFFE, 0xE00D);
    const SEQUENCE_DELIMITATION: Tag = Tag(0xFFFE, 0xE0DD);

    fn truncated(self) -> DecodeError {
        DecodeError::Truncated { group: self.0, element: self.1 }
    }
}

struct Header {
    tag: Tag,
    length: u32,
}

struct Element<'a> {
    tag: Tag,
    value: &'a [u8],
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    explicit_vr: bool,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos, explicit_vr: true }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn take(&mut self, len: usize, tag: Tag) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or_else(|| tag.truncated())?;
        let slice = self.bytes.get(self.pos..end).ok_or_else(|| tag.truncated())?;
        self.pos = end;
        Ok(slice)
    }

    fn u16(&mut self, tag: Tag) -> Result<u16> {
        let b = self.take(2, tag)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, tag: Tag) -> Result<u32> {
        let b = self.take(4, tag)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn peek_group(&self) -> Option<u16> {
        let b = self.bytes.get(self.pos..self.pos + 2)?;
        Some(u16::from_le_bytes([b[0], b[1]]))
    }

    fn header(&mut self) -> Result<Header> {
        let unknown = Tag(0xFFFF, 0xFFFF);
        let tag = Tag(self.u16(unknown)?, self.u16(unknown)?);

        // Items and delimiters never carry a VR.
        let length = if tag.0 == 0xFFFE || !self.explicit_vr {
            self.u32(tag)?
        } else {
            let vr = self.take(2, tag)?;
            if LONG_VRS.iter().any(|long| long.as_slice() == vr) {
                self.take(2, tag)?;
                self.u32(tag)?
            } else {
                u32::from(self.u16(tag)?)
            }
        };
        Ok(Header { tag, length })
    }

    /// Next top-level element, `None` once the buffer is exhausted.
    fn next_element(&mut self) -> Result<Option<Element<'a>>> {
        if self.at_end() {
            return Ok(None);
        }
        let Header { tag, length } = self.header()?;
        if length == UNDEFINED_LENGTH {
            if tag == Tag::PIXEL_DATA {
                return Err(DecodeError::UnsupportedTransferSyntax(
                    "encapsulated pixel data".to_string(),
                )
                .into());
            }
            self.skip_undefined(tag)?;
            return Ok(Some(Element { tag, value: &[] }));
        }
        let value = self.take(length as usize, tag)?;
        Ok(Some(Element { tag, value }))
    }

    /// Skip a sequence or item of undefined length, including nested ones.
    fn skip_undefined(&mut self, owner: Tag) -> Result<()> {
        loop {
            if self.at_end() {
                return Err(owner.truncated().into());
            }
            let Header { tag, length } = self.header()?;
            if tag == Tag::SEQUENCE_DELIMITATION || tag == Tag::ITEM_DELIMITATION {
                return Ok(());
            }
            if length == UNDEFINED_LENGTH {
                self.skip_undefined(tag)?;
            } else {
                self.take(length as usize, tag)?;
            }
        }
    }
}

fn text(value: &[u8]) -> String {
    String::from_utf8_lossy(value)
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}

fn us(value: &[u8], name: &'static str) -> Result<u16> {
    match value {
        [lo, hi, ..] => Ok(u16::from_le_bytes([*lo, *hi])),
        _ => Err(DecodeError::InvalidNumber { tag: name, value: format!("{value:?}") }.into()),
    }
}

/// First value of a (possibly multi-valued) decimal string; empty means absent.
fn ds(value: &[u8], name: &'static str) -> Result<Option<f64>> {
    let raw = text(value);
    let first = raw.split('\\').next().unwrap_or_default().trim();
    if first.is_empty() {
        return Ok(None);
    }
    match first.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(Some(number)),
        _ => Err(DecodeError::InvalidNumber { tag: name, value: raw.clone() }.into()),
    }
}

/// Decoder for DICOM Part 10 files (preamble + `DICM` + meta group + dataset).
#[derive(Debug, Clone, Default)]
pub struct Part10Decoder;

impl SliceDecoder for Part10Decoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedSlice> {
        if bytes.get(PREAMBLE_LEN..PREAMBLE_LEN + 4) != Some(PREFIX.as_slice()) {
            return Err(DecodeError::MissingPrefix.into());
        }
        let mut reader = Reader::new(bytes, PREAMBLE_LEN + 4);

        // File meta information is always explicit VR little endian.
        let mut transfer_syntax = IMPLICIT_VR_LITTLE_ENDIAN.to_string();
        while reader.peek_group() == Some(0x0002) {
            match reader.next_element()? {
                Some(el) if el.tag == Tag::TRANSFER_SYNTAX => transfer_syntax = text(el.value),
                Some(_) => {}
                None => break,
            }
        }
        reader.explicit_vr = match transfer_syntax.as_str() {
            IMPLICIT_VR_LITTLE_ENDIAN => false,
            EXPLICIT_VR_LITTLE_ENDIAN => true,
            other => return Err(DecodeError::UnsupportedTransferSyntax(other.to_string()).into()),
        };

        let mut rows = None;
        let mut columns = None;
        let mut bits_allocated = None;
        let mut modality = None;
        let mut window_center = None;
        let mut window_width = None;
        let mut rescale = Rescale::default();
        let mut pixel_bytes = None;

        while let Some(el) = reader.next_element()? {
            match el.tag {
                Tag::MODALITY => modality = Some(text(el.value)),
                Tag::ROWS => rows = Some(us(el.value, "Rows")?),
                Tag::COLUMNS => columns = Some(us(el.value, "Columns")?),
                Tag::BITS_ALLOCATED => bits_allocated = Some(us(el.value, "BitsAllocated")?),
                Tag::WINDOW_CENTER => window_center = ds(el.value, "WindowCenter")?,
                Tag::WINDOW_WIDTH => window_width = ds(el.value, "WindowWidth")?,
                Tag::RESCALE_INTERCEPT => {
                    rescale.intercept = ds(el.value, "RescaleIntercept")?.unwrap_or(0.0)
                }
                Tag::RESCALE_SLOPE => {
                    rescale.slope = ds(el.value, "RescaleSlope")?.unwrap_or(1.0)
                }
                Tag::PIXEL_DATA => {
                    pixel_bytes = Some(el.value);
                    break;
                }
                _ => {}
            }
        }

        let rows = rows.ok_or(DecodeError::MissingElement("Rows"))?;
        let columns = columns.ok_or(DecodeError::MissingElement("Columns"))?;
        let bits_allocated = bits_allocated.ok_or(DecodeError::MissingElement("BitsAllocated"))?;
        let pixel_bytes = pixel_bytes.ok_or(DecodeError::MissingElement("PixelData"))?;
        if bits_allocated != 16 {
            return Err(DecodeError::UnsupportedBitDepth(bits_allocated).into());
        }

        let dimensions = Dimensions::new(u32::from(columns), u32::from(rows));
        let mut samples: Vec<u16> = pixel_bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        if samples.len() > dimensions.pixel_count() {
            debug!(
                "Ignoring {} samples beyond the first frame",
                samples.len() - dimensions.pixel_count()
            );
            samples.truncate(dimensions.pixel_count());
        }

        Ok(DecodedSlice {
            dimensions,
            bits_allocated,
            window_center,
            window_width,
            rescale,
            modality,
            transfer_syntax,
            samples,
        })
    }
}
