use byteorder::{ByteOrder, LittleEndian};
use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::encoding::EncodingError;

/// Byte range of a named sub-buffer.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct BufferView {
    pub offset: usize,
    pub length: usize,
}

impl BufferView {
    pub fn new(offset: usize, length: usize) -> Self {
        BufferView { offset, length }
    }

    /// Gets the exclusive end of the range, if it is representable.
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.length)
    }
}

/// Mapping of field names to sub-buffers.
///
/// This is the container metadata of an encoded mesh: each field is located by
/// name rather than by position, so optional fields (such as attributes) may be
/// present or absent independently.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BufferLayout {
    views: BTreeMap<String, BufferView>,
}

impl BufferLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T>(&mut self, field: T, view: BufferView) -> Option<BufferView>
    where
        T: Into<String>,
    {
        self.views.insert(field.into(), view)
    }

    pub fn get(&self, field: &str) -> Option<&BufferView> {
        self.views.get(field)
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.views.contains_key(field)
    }

    /// Gets an iterator over the fields and views in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, BufferView> {
        self.views.iter()
    }

    /// Gets an iterator over the fields that begin with the given prefix.
    pub fn fields_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl 'a + Iterator<Item = (&'a str, &'a BufferView)> {
        self.views
            .range(prefix.to_owned()..)
            .take_while(move |(field, _)| field.starts_with(prefix))
            .map(|(field, view)| (field.as_str(), view))
    }

    /// Slices the bytes of a field.
    ///
    /// Returns `Ok(None)` if the field is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the view of the field exceeds `data`.
    pub fn slice<'a>(&self, data: &'a [u8], field: &str) -> Result<Option<&'a [u8]>, EncodingError> {
        match self.views.get(field) {
            Some(view) => {
                let end = view.end().ok_or_else(|| truncated(field, usize::MAX, data.len()))?;
                data.get(view.offset..end)
                    .map(Some)
                    .ok_or_else(|| truncated(field, end, data.len()))
            }
            None => Ok(None),
        }
    }

    /// Slices the bytes of a field that must be present.
    pub fn require<'a>(&self, data: &'a [u8], field: &str) -> Result<&'a [u8], EncodingError> {
        self.slice(data, field)?
            .ok_or_else(|| EncodingError::MissingRequiredField {
                field: field.to_owned(),
            })
    }
}

impl<'a> IntoIterator for &'a BufferLayout {
    type Item = (&'a String, &'a BufferView);
    type IntoIter = btree_map::Iter<'a, String, BufferView>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub(in crate::encoding) fn truncated(field: &str, expected: usize, actual: usize) -> EncodingError {
    EncodingError::TruncatedBuffer {
        field: field.to_owned(),
        expected,
        actual,
    }
}

/// Appends little-endian fields to a buffer and records their views.
#[derive(Debug, Default)]
pub(in crate::encoding) struct Writer {
    data: Vec<u8>,
    layout: BufferLayout,
    start: usize,
}

impl Writer {
    /// Records everything written since the previous field as the given
    /// field.
    pub fn finish_field<T>(&mut self, field: T)
    where
        T: Into<String>,
    {
        let offset = self.start;
        self.start = self.data.len();
        self.layout
            .insert(field, BufferView::new(offset, self.data.len() - offset));
    }

    pub fn write_u32(&mut self, value: u32) {
        let mut bytes = [0u8; 4];
        LittleEndian::write_u32(&mut bytes, value);
        self.data.extend_from_slice(&bytes);
    }

    pub fn write_f32(&mut self, value: f32) {
        let mut bytes = [0u8; 4];
        LittleEndian::write_f32(&mut bytes, value);
        self.data.extend_from_slice(&bytes);
    }

    pub fn write_f32s(&mut self, values: &[f32]) {
        for value in values {
            self.write_f32(*value);
        }
    }

    pub fn into_parts(self) -> (Vec<u8>, BufferLayout) {
        let Writer { data, layout, .. } = self;
        (data, layout)
    }
}

/// Reads little-endian values from the bytes of a field.
///
/// Every read is checked against the length of the field.
#[derive(Clone, Copy, Debug)]
pub(in crate::encoding) struct Reader<'a> {
    field: &'a str,
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    pub fn new(field: &'a str, bytes: &'a [u8]) -> Self {
        Reader {
            field,
            bytes,
            position: 0,
        }
    }

    /// Fails unless another `n` bytes can be read.
    pub fn require(&self, n: usize) -> Result<(), EncodingError> {
        match self.position.checked_add(n) {
            Some(end) if end <= self.bytes.len() => Ok(()),
            end => Err(truncated(
                self.field,
                end.unwrap_or(usize::MAX),
                self.bytes.len(),
            )),
        }
    }

    /// Reads a count of records of the given width and checks that the records
    /// can be read.
    pub fn read_count(&mut self, width: usize) -> Result<usize, EncodingError> {
        let count = self.read_u32()? as usize;
        self.require(count.checked_mul(width).unwrap_or(usize::MAX))?;
        Ok(count)
    }

    pub fn read_u32(&mut self) -> Result<u32, EncodingError> {
        self.require(4)?;
        let value = LittleEndian::read_u32(&self.bytes[self.position..]);
        self.position += 4;
        Ok(value)
    }

    pub fn read_f32(&mut self) -> Result<f32, EncodingError> {
        self.require(4)?;
        let value = LittleEndian::read_f32(&self.bytes[self.position..]);
        self.position += 4;
        Ok(value)
    }

    pub fn read_xyz(&mut self) -> Result<[f32; 3], EncodingError> {
        Ok([self.read_f32()?, self.read_f32()?, self.read_f32()?])
    }
}

#[cfg(test)]
mod tests {
    use crate::encoding::binary::layout::{BufferLayout, BufferView, Reader, Writer};
    use crate::encoding::EncodingError;

    #[test]
    fn writer_records_views() {
        let mut writer = Writer::default();
        writer.write_u32(1);
        writer.finish_field("a");
        writer.write_f32(1.0);
        writer.write_u32(u32::MAX);
        writer.finish_field("b");
        let (data, layout) = writer.into_parts();

        assert_eq!(&[1, 0, 0, 0, 0, 0, 0x80, 0x3f, 0xff, 0xff, 0xff, 0xff], data.as_slice());
        assert_eq!(Some(&BufferView::new(0, 4)), layout.get("a"));
        assert_eq!(Some(&BufferView::new(4, 8)), layout.get("b"));
    }

    #[test]
    fn slice_out_of_bounds() {
        let mut layout = BufferLayout::new();
        layout.insert("a", BufferView::new(2, 4));

        assert_eq!(
            Err(EncodingError::TruncatedBuffer {
                field: "a".to_owned(),
                expected: 6,
                actual: 5,
            }),
            layout.slice(&[0; 5], "a")
        );
        assert_eq!(Ok(None), layout.slice(&[0; 5], "b"));
        assert_eq!(
            Err(EncodingError::MissingRequiredField {
                field: "b".to_owned(),
            }),
            layout.require(&[0; 5], "b")
        );
    }

    #[test]
    fn reader_rejects_truncated_records() {
        let mut reader = Reader::new("a", &[2, 0, 0, 0, 0, 0, 0, 0]);

        assert_eq!(
            Err(EncodingError::TruncatedBuffer {
                field: "a".to_owned(),
                expected: 12,
                actual: 8,
            }),
            reader.read_count(4)
        );
    }

    #[test]
    fn fields_with_prefix() {
        let mut layout = BufferLayout::new();
        for field in ["edges", "edges.attributes.CREASE", "faces", "vertices.attributes.NORMAL"] {
            layout.insert(field, BufferView::default());
        }

        assert_eq!(
            vec!["edges.attributes.CREASE"],
            layout
                .fields_with_prefix("edges.attributes.")
                .map(|(field, _)| field)
                .collect::<Vec<_>>()
        );
    }
}
