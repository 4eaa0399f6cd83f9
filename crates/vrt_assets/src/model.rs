//! Parsed-model descriptors and the object/material state builder
//!
//! Loaders feed object and material declarations into [`ModelBuilder`] in
//! source order; the builder takes care of the bookkeeping the formats leave
//! implicit: the placeholder object before the first declaration, material
//! inheritance across object boundaries, and start/end ranges of material
//! assignments over the vertex stream.
//!
//! All of this is pure bookkeeping with no failure modes; malformed input
//! degrades to empty objects or zero-length ranges, which consumers must
//! tolerate.

/// Whether an object came from an explicit declaration in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declaration {
    /// Implicit placeholder created before any declaration was seen
    Pending,
    /// Explicitly declared (named group/object record)
    Declared,
}

/// Flat geometry streams owned by one parsed object
#[derive(Debug, Clone, Default)]
pub struct GeometrySlices {
    /// Vertex positions, three scalars per vertex
    pub vertices: Vec<f32>,
    /// Vertex normals, three scalars per vertex
    pub normals: Vec<f32>,
    /// Texture coordinates, two scalars per vertex
    pub uvs: Vec<f32>,
    /// Opaque compressed payload (VRT records); decoded downstream
    pub compressed: Option<Vec<u8>>,
}

impl GeometrySlices {
    /// True when no geometry of any kind has been attached
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
            && self.normals.is_empty()
            && self.uvs.is_empty()
            && self.compressed.is_none()
    }

    /// Number of vertices in the position stream
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

/// One material applied to a contiguous span of an object's vertices
#[derive(Debug, Clone)]
pub struct MaterialAssignment {
    /// Position in the owning object's assignment list at creation time
    pub index: usize,
    /// Material name (`usemtl` / VRT record material field); may be empty
    pub name: String,
    /// Material library the name refers to; may be empty
    pub mtllib: String,
    /// Smooth-shading flag in effect for this span
    pub smooth: bool,
    /// First vertex of the span
    pub group_start: usize,
    /// One-past-last vertex of the span; `None` while still open
    pub group_end: Option<usize>,
    /// Span length in vertices; 0 until the span is closed
    pub group_count: usize,
    /// Carried over from the previous object rather than declared
    pub inherited: bool,
}

impl MaterialAssignment {
    fn clone_for_inheritance(&self, index: usize) -> Self {
        Self {
            index,
            name: self.name.clone(),
            mtllib: self.mtllib.clone(),
            smooth: self.smooth,
            group_start: 0,
            group_end: None,
            group_count: 0,
            inherited: true,
        }
    }

    fn empty_default(smooth: bool) -> Self {
        Self {
            index: 0,
            name: String::new(),
            mtllib: String::new(),
            smooth,
            group_start: 0,
            group_end: Some(0),
            group_count: 0,
            inherited: false,
        }
    }
}

/// A named grouping of geometry and material assignments (a sub-mesh)
#[derive(Debug, Clone)]
pub struct ParsedObject {
    /// Object name; empty for an unnamed implicit object
    pub name: String,
    /// Whether the object was explicitly declared
    pub declaration: Declaration,
    /// Geometry streams owned by this object
    pub geometry: GeometrySlices,
    /// Material assignments in span order
    pub materials: Vec<MaterialAssignment>,
    /// Object-level smooth-shading flag
    pub smooth: bool,
}

impl ParsedObject {
    fn new(name: &str, declaration: Declaration) -> Self {
        Self {
            name: name.to_string(),
            declaration,
            geometry: GeometrySlices::default(),
            materials: Vec::new(),
            smooth: true,
        }
    }

    /// The assignment currently receiving geometry, if any
    pub fn current_material(&self) -> Option<&MaterialAssignment> {
        self.materials.last()
    }

    fn current_material_mut(&mut self) -> Option<&mut MaterialAssignment> {
        self.materials.last_mut()
    }

    /// Close the trailing open span against the current vertex count.
    ///
    /// When `end` is set the object is being closed for good: assignments
    /// that never received geometry are dropped, and a synthetic empty
    /// assignment is inserted if none survive.
    fn finalize(&mut self, end: bool) {
        let vertex_count = self.geometry.vertex_count();
        if let Some(last) = self.materials.last_mut() {
            if last.group_end.is_none() {
                last.group_end = Some(vertex_count);
                last.group_count = vertex_count.saturating_sub(last.group_start);
                last.inherited = false;
            }
        }

        if end && self.materials.len() > 1 {
            self.materials.retain(|m| m.group_count > 0);
        }

        if end && self.materials.is_empty() {
            self.materials.push(MaterialAssignment::empty_default(self.smooth));
        }
    }
}

/// Finished output of a parse: objects in source order plus the set of
/// referenced material libraries
#[derive(Debug, Clone)]
pub struct ParsedModel {
    /// Parsed objects in declaration order
    pub objects: Vec<ParsedObject>,
    /// Material-library names referenced during the parse, first-seen order
    pub material_libraries: Vec<String>,
}

/// Accumulates objects and material assignments during a parse
///
/// One builder per parse invocation; [`ModelBuilder::finish`] consumes it.
#[derive(Debug)]
pub struct ModelBuilder {
    objects: Vec<ParsedObject>,
    current: ParsedObject,
    material_libraries: Vec<String>,
}

impl ModelBuilder {
    /// Create a builder holding the implicit placeholder object
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            current: ParsedObject::new("", Declaration::Pending),
            material_libraries: Vec::new(),
        }
    }

    /// Begin a new object.
    ///
    /// If the current object is still the implicit placeholder and has no
    /// geometry, it is renamed in place instead of starting a fresh object.
    /// Otherwise the current object is finalized and pushed; if it ended
    /// with a named material, that material is carried into the new object
    /// as an inherited assignment.
    pub fn start_object(&mut self, name: &str) {
        if self.current.declaration == Declaration::Pending && self.current.geometry.is_empty() {
            self.current.name = name.to_string();
            self.current.declaration = Declaration::Declared;
            return;
        }

        // Capture before finalize: zero-count assignments may be dropped.
        let carried = self
            .current
            .current_material()
            .filter(|m| !m.name.is_empty())
            .map(|m| m.clone_for_inheritance(0));

        self.current.finalize(true);

        let mut next = ParsedObject::new(name, Declaration::Declared);
        if let Some(inherited) = carried {
            next.materials.push(inherited);
        }

        let done = std::mem::replace(&mut self.current, next);
        self.objects.push(done);
    }

    /// Begin a new material assignment on the current object.
    ///
    /// Closes the open span first. An immediately preceding assignment that
    /// was inherited but never used is removed; a new declaration overrides
    /// it.
    pub fn start_material(&mut self, name: &str, libraries: &[String]) {
        self.current.finalize(false);

        let previous = self.current.current_material().map(|m| {
            (m.index, m.inherited, m.group_count, m.group_end, m.smooth)
        });

        if let Some((index, inherited, count, _, _)) = previous {
            if inherited || count == 0 {
                self.current.materials.remove(index);
            }
        }

        let assignment = MaterialAssignment {
            index: self.current.materials.len(),
            name: name.to_string(),
            mtllib: libraries.last().cloned().unwrap_or_default(),
            smooth: previous.map_or(self.current.smooth, |(_, _, _, _, s)| s),
            group_start: previous.map_or(0, |(_, _, _, end, _)| end.unwrap_or(0)),
            group_end: None,
            group_count: 0,
            inherited: false,
        };
        self.current.materials.push(assignment);

        for lib in libraries {
            if !lib.is_empty() && !self.material_libraries.contains(lib) {
                self.material_libraries.push(lib.clone());
            }
        }
    }

    /// Set the smoothing flag on the current object and its open material
    pub fn set_smoothing(&mut self, smooth: bool) {
        self.current.smooth = smooth;
        if let Some(m) = self.current.current_material_mut() {
            m.smooth = smooth;
        }
    }

    /// Attach an opaque compressed-geometry payload to the current object
    pub fn set_compressed_payload(&mut self, payload: Vec<u8>) {
        self.current.geometry.compressed = Some(payload);
    }

    /// Append a vertex position to the current object
    pub fn push_vertex(&mut self, x: f32, y: f32, z: f32) {
        self.current.geometry.vertices.extend_from_slice(&[x, y, z]);
    }

    /// Append a vertex normal to the current object
    pub fn push_normal(&mut self, x: f32, y: f32, z: f32) {
        self.current.geometry.normals.extend_from_slice(&[x, y, z]);
    }

    /// Append a texture coordinate to the current object
    pub fn push_uv(&mut self, u: f32, v: f32) {
        self.current.geometry.uvs.extend_from_slice(&[u, v]);
    }

    /// The object currently being built
    pub fn current_object(&self) -> &ParsedObject {
        &self.current
    }

    /// Finalize the last object and return the finished model
    pub fn finish(mut self) -> ParsedModel {
        self.current.finalize(true);
        self.objects.push(self.current);

        log::debug!(
            "Model parse finished: {} object(s), {} material librar(ies)",
            self.objects.len(),
            self.material_libraries.len()
        );

        ParsedModel {
            objects: self.objects,
            material_libraries: self.material_libraries,
        }
    }
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}
