//! Base material resources

/// Base material group (`<basematerials>`)
///
/// Triangles and objects refer to a material by the group ID (`pid`) and
/// the zero-based position of the material in the group (`p1`..`p3`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseMaterialsGroup {
    /// Base material group ID
    pub id: usize,
    /// List of base materials in this group
    pub materials: Vec<BaseMaterial>,
}

impl BaseMaterialsGroup {
    /// Create a new base material group
    pub fn new(id: usize) -> Self {
        Self {
            id,
            materials: Vec::new(),
        }
    }

    /// Material at the given property index
    pub fn get(&self, index: usize) -> Option<&BaseMaterial> {
        self.materials.get(index)
    }
}

/// Individual base material within a base material group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseMaterial {
    /// Material name
    pub name: String,
    /// Display color in RGBA format (red, green, blue, alpha)
    pub displaycolor: (u8, u8, u8, u8),
}

impl BaseMaterial {
    /// Create a new base material
    pub fn new(name: String, displaycolor: (u8, u8, u8, u8)) -> Self {
        Self { name, displaycolor }
    }
}
