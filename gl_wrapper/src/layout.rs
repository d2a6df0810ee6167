use gl::types::GLenum;
use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Float,
    UnsignedInt,
    UnsignedByte,
}

impl ElementKind {
    pub fn gl_type(&self) -> GLenum {
        match self {
            ElementKind::Float => gl::FLOAT,
            ElementKind::UnsignedInt => gl::UNSIGNED_INT,
            ElementKind::UnsignedByte => gl::UNSIGNED_BYTE,
        }
    }

    pub fn size(&self) -> u32 {
        match self {
            ElementKind::Float => 4,
            ElementKind::UnsignedInt => 4,
            ElementKind::UnsignedByte => 1,
        }
    }
}

/// Rust types that can back a vertex attribute.
pub trait LayoutType {
    const KIND: ElementKind;
    const NORMALIZED: bool;
}

impl LayoutType for f32 {
    const KIND: ElementKind = ElementKind::Float;
    const NORMALIZED: bool = false;
}

impl LayoutType for u32 {
    const KIND: ElementKind = ElementKind::UnsignedInt;
    const NORMALIZED: bool = false;
}

impl LayoutType for u8 {
    const KIND: ElementKind = ElementKind::UnsignedByte;
    const NORMALIZED: bool = true;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VertexBufferElement {
    pub kind: ElementKind,
    pub count: u32,
    pub normalized: bool,
}

impl VertexBufferElement {
    pub fn size(&self) -> u32 {
        self.count * self.kind.size()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Attribute component count must be between 1 and 4, got {0}")]
    InvalidCount(u32),
}

/// Attribute layout of one vertex record.
///
/// Elements must be pushed in the order they appear in memory; nothing
/// checks them against the buffer they are used with.
#[derive(Debug, Clone, Default)]
pub struct VertexBufferLayout {
    elements: Vec<VertexBufferElement>,
    stride: u32,
}

impl VertexBufferLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<T: LayoutType>(&mut self, count: u32) -> Result<&mut Self, LayoutError> {
        self.push_element(VertexBufferElement {
            kind: T::KIND,
            count,
            normalized: T::NORMALIZED,
        })
    }

    pub fn push_element(
        &mut self,
        element: VertexBufferElement,
    ) -> Result<&mut Self, LayoutError> {
        if !(1..=4).contains(&element.count) {
            return Err(LayoutError::InvalidCount(element.count));
        }

        self.elements.push(element);
        self.stride = self.elements.iter().map(|e| e.size()).sum();

        Ok(self)
    }

    pub fn elements(&self) -> &[VertexBufferElement] {
        &self.elements
    }

    /// Byte size of one vertex record.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Yields `(slot, element, byte offset)` in push order.
    pub fn attributes(&self) -> impl Iterator<Item = (u32, &VertexBufferElement, u32)> + '_ {
        self.elements
            .iter()
            .enumerate()
            .scan(0, |offset, (slot, element)| {
                let current = *offset;
                *offset += element.size();
                Some((slot as u32, element, current))
            })
    }
}
