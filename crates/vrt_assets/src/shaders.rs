//! Fragment shader sources the two material workflows pair with.
//!
//! Shipped as GLSL text; hosts compile them with whatever toolchain their
//! renderer uses.

/// Blinn-Phong fragment shader for [`crate::materials::MaterialKind::Specular`]
pub const SPECULAR_FRAG: &str = include_str!("../shaders/specular.frag");

/// Metalness-workflow fragment shader for
/// [`crate::materials::MaterialKind::Metalness`]
pub const METALNESS_FRAG: &str = include_str!("../shaders/metalness.frag");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_sources_present() {
        assert!(SPECULAR_FRAG.contains("shininess"));
        assert!(METALNESS_FRAG.contains("metalness"));
    }
}
