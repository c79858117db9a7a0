use std::cell::RefCell;

/// Where a style attribute reaches the shader from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttributeScope {
    /// Per-vertex buffer attribute.
    Vertex,
    /// Per-instance buffer attribute.
    Instance,
    /// Sampled from a style texture by feature UV.
    Texture,
}

/// A style attribute a model consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDescriptor {
    pub name: &'static str,
    pub scope: AttributeScope,
    /// Number of `f32` components per feature.
    pub components: u32,
}

impl AttributeDescriptor {
    pub const fn new(name: &'static str, scope: AttributeScope, components: u32) -> Self {
        Self { name, scope, components }
    }
}

/// Registry of style attributes declared by models.
pub trait StyleAttributeService {
    /// Registers `attr`, replacing any earlier registration with the same name.
    fn register_attribute(&self, attr: AttributeDescriptor);

    /// Registered attributes, in first-registration order.
    fn attributes(&self) -> Vec<AttributeDescriptor>;

    fn attribute(&self, name: &str) -> Option<AttributeDescriptor> {
        self.attributes().into_iter().find(|a| a.name == name)
    }
}

/// In-memory [`StyleAttributeService`].
#[derive(Debug, Default)]
pub struct AttributeRegistry {
    attrs: RefCell<Vec<AttributeDescriptor>>,
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StyleAttributeService for AttributeRegistry {
    fn register_attribute(&self, attr: AttributeDescriptor) {
        let mut attrs = self.attrs.borrow_mut();
        match attrs.iter_mut().find(|a| a.name == attr.name) {
            Some(existing) => *existing = attr,
            None => attrs.push(attr),
        }
    }

    fn attributes(&self) -> Vec<AttributeDescriptor> {
        self.attrs.borrow().clone()
    }
}
