use std::collections::BTreeMap;

/// Well-known attribute names.
///
/// Attributes are keyed by arbitrary strings; these are the names used by
/// common asset formats for per-vertex, per-edge, and per-corner data.
pub mod name {
    pub const NORMAL: &str = "NORMAL";
    pub const TANGENT: &str = "TANGENT";
    pub const CREASE: &str = "CREASE";
    pub const TEXCOORD_0: &str = "TEXCOORD_0";
    pub const COLOR_0: &str = "COLOR_0";
}

/// Attribute value of one to four `f32` components.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Attribute {
    Scalar(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
}

impl Attribute {
    /// Constructs an attribute from a slice of components.
    ///
    /// Returns `None` if the slice does not have between one and four
    /// components.
    pub fn from_slice(components: &[f32]) -> Option<Self> {
        match *components {
            [x] => Some(Attribute::Scalar(x)),
            [x, y] => Some(Attribute::Vec2([x, y])),
            [x, y, z] => Some(Attribute::Vec3([x, y, z])),
            [x, y, z, w] => Some(Attribute::Vec4([x, y, z, w])),
            _ => None,
        }
    }

    /// Gets the number of components.
    pub fn arity(&self) -> usize {
        self.as_slice().len()
    }

    pub fn as_slice(&self) -> &[f32] {
        match self {
            Attribute::Scalar(x) => std::slice::from_ref(x),
            Attribute::Vec2(xs) => xs,
            Attribute::Vec3(xs) => xs,
            Attribute::Vec4(xs) => xs,
        }
    }

    /// Compares components by their bit patterns.
    ///
    /// Unlike `PartialEq`, this considers `NaN` components with identical
    /// payloads equal, which is the notion of equality preserved by lossless
    /// encodings.
    pub fn bit_eq(&self, other: &Self) -> bool {
        self.arity() == other.arity()
            && self
                .as_slice()
                .iter()
                .zip(other.as_slice())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl From<f32> for Attribute {
    fn from(x: f32) -> Self {
        Attribute::Scalar(x)
    }
}

impl From<[f32; 2]> for Attribute {
    fn from(xs: [f32; 2]) -> Self {
        Attribute::Vec2(xs)
    }
}

impl From<[f32; 3]> for Attribute {
    fn from(xs: [f32; 3]) -> Self {
        Attribute::Vec3(xs)
    }
}

impl From<[f32; 4]> for Attribute {
    fn from(xs: [f32; 4]) -> Self {
        Attribute::Vec4(xs)
    }
}

/// String-keyed attributes of an entity.
///
/// Names are ordered so that encodings are deterministic.
pub type Attributes = BTreeMap<String, Attribute>;

pub(crate) fn attributes_bit_eq(a: &Attributes, b: &Attributes) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|((name, a), (other, b))| name == other && a.bit_eq(b))
}
