//! Shader program build: parse + validate both WGSL stages with naga,
//! check the stage interface, and reflect attribute locations by name.
//!
//! Diagnostics are always logged, success included.

use std::collections::BTreeSet;

use asset::{ShaderPair, ShaderText};
use corelib::{CoreError, CoreResult};
use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{Binding, EntryPoint, Module, ShaderStage, TypeInner};

/// Vertex attribute carrying the grid position.
pub const POSITION_ATTRIBUTE: &str = "vPosition";
/// Vertex attribute carrying the texture coordinate.
pub const TEXCOORD_ATTRIBUTE: &str = "vTexCoord";

/// One validated stage.
pub struct CompiledStage {
    pub text: ShaderText,
    pub module: Module,
    pub entry_point: String,
    entry_index: usize,
}

impl CompiledStage {
    fn entry(&self) -> &EntryPoint {
        &self.module.entry_points[self.entry_index]
    }
}

/// Linked vertex + fragment stages with resolved attribute locations.
pub struct ShaderProgram {
    pub vertex: CompiledStage,
    pub fragment: CompiledStage,
    pub position_location: u32,
    pub texcoord_location: u32,
}

impl ShaderProgram {
    /// Compile both stages, link them and look up the vertex attributes.
    pub fn build(shaders: &ShaderPair) -> CoreResult<Self> {
        let vertex = compile_stage(&shaders.vertex, ShaderStage::Vertex)?;
        let fragment = compile_stage(&shaders.fragment, ShaderStage::Fragment)?;
        link(&vertex, &fragment)?;

        let position_location = attribute_location(&vertex, POSITION_ATTRIBUTE)?;
        let texcoord_location = attribute_location(&vertex, TEXCOORD_ATTRIBUTE)?;
        log::info!(
            "Program linked: {POSITION_ATTRIBUTE}@{position_location}, {TEXCOORD_ATTRIBUTE}@{texcoord_location}"
        );

        Ok(Self {
            vertex,
            fragment,
            position_location,
            texcoord_location,
        })
    }
}

fn stage_name(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "vertex",
        ShaderStage::Fragment => "fragment",
        _ => "compute",
    }
}

/// Parse and validate one WGSL text, requiring an entry point of `stage`.
pub fn compile_stage(text: &ShaderText, stage: ShaderStage) -> CoreResult<CompiledStage> {
    let name = stage_name(stage);
    let source = &text.source;

    let module = naga::front::wgsl::parse_str(source).map_err(|e| {
        let log = e.emit_to_string(source);
        log::error!("{} ({:?}):\n{log}", name, text.path);
        CoreError::ShaderCompile { stage: name, log }
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| {
            let log = e.emit_to_string(source);
            log::error!("{} ({:?}):\n{log}", name, text.path);
            CoreError::ShaderCompile { stage: name, log }
        })?;

    let entry_index = module
        .entry_points
        .iter()
        .position(|ep| ep.stage == stage)
        .ok_or_else(|| CoreError::ShaderCompile {
            stage: name,
            log: format!("no @{name} entry point in {:?}", text.path),
        })?;
    let entry_point = module.entry_points[entry_index].name.clone();

    log::info!(
        "{} shader {:?} compiled: entry `{entry_point}`, {} globals",
        name,
        text.path,
        module.global_variables.len()
    );

    Ok(CompiledStage {
        text: text.clone(),
        module,
        entry_point,
        entry_index,
    })
}

/// Every location the fragment stage reads must be written by the vertex stage.
pub fn link(vertex: &CompiledStage, fragment: &CompiledStage) -> CoreResult<()> {
    let outputs = output_locations(&vertex.module, vertex.entry());
    let inputs = input_locations(&fragment.module, fragment.entry());

    let missing: Vec<u32> = inputs.difference(&outputs).copied().collect();
    if !missing.is_empty() {
        let msg = format!(
            "fragment inputs {missing:?} are not written by the vertex stage (outputs {outputs:?})"
        );
        log::error!("{msg}");
        return Err(CoreError::ShaderLink(msg));
    }
    Ok(())
}

/// Location of the vertex input called `name`.
pub fn attribute_location(vertex: &CompiledStage, name: &str) -> CoreResult<u32> {
    let module = &vertex.module;
    for arg in &vertex.entry().function.arguments {
        if arg.name.as_deref() == Some(name) {
            if let Some(Binding::Location { location, .. }) = &arg.binding {
                return Ok(*location);
            }
        }
        if let TypeInner::Struct { members, .. } = &module.types[arg.ty].inner {
            for member in members {
                if member.name.as_deref() != Some(name) {
                    continue;
                }
                if let Some(Binding::Location { location, .. }) = &member.binding {
                    return Ok(*location);
                }
            }
        }
    }
    Err(CoreError::MissingAttribute(name.to_string()))
}

fn input_locations(module: &Module, entry: &EntryPoint) -> BTreeSet<u32> {
    let mut out = BTreeSet::new();
    for arg in &entry.function.arguments {
        collect_locations(module, arg.ty, arg.binding.as_ref(), &mut out);
    }
    out
}

fn output_locations(module: &Module, entry: &EntryPoint) -> BTreeSet<u32> {
    let mut out = BTreeSet::new();
    if let Some(result) = &entry.function.result {
        collect_locations(module, result.ty, result.binding.as_ref(), &mut out);
    }
    out
}

fn collect_locations(
    module: &Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&Binding>,
    out: &mut BTreeSet<u32>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => {
            out.insert(*location);
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    if let Some(Binding::Location { location, .. }) = &member.binding {
                        out.insert(*location);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERT: &str = include_str!("../../../assets/shaders/water.vert.wgsl");
    const FRAG: &str = include_str!("../../../assets/shaders/water.frag.wgsl");

    fn pair(vertex: &str, fragment: &str) -> ShaderPair {
        ShaderPair {
            vertex: ShaderText::from_source("water.vert.wgsl", vertex),
            fragment: ShaderText::from_source("water.frag.wgsl", fragment),
        }
    }

    #[test]
    fn bundled_program_builds() {
        let program = ShaderProgram::build(&pair(VERT, FRAG)).expect("bundled program");
        assert_eq!(program.position_location, 0);
        assert_eq!(program.texcoord_location, 1);
        assert_eq!(program.vertex.entry_point, "vs_main");
        assert_eq!(program.fragment.entry_point, "fs_main");
    }

    #[test]
    fn syntax_error_carries_diagnostics() {
        let broken = "@vertex fn vs_main( -> @builtin(position) vec4<f32> {}";
        let err = compile_stage(
            &ShaderText::from_source("broken.wgsl", broken),
            ShaderStage::Vertex,
        )
        .err()
        .expect("must fail");
        match err {
            CoreError::ShaderCompile { stage, log } => {
                assert_eq!(stage, "vertex");
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wrong_stage_is_rejected() {
        let err = compile_stage(
            &ShaderText::from_source("water.frag.wgsl", FRAG),
            ShaderStage::Vertex,
        )
        .err()
        .expect("fragment text has no vertex entry");
        assert!(matches!(err, CoreError::ShaderCompile { .. }));
    }

    #[test]
    fn unmatched_fragment_input_fails_to_link() {
        let frag = r#"
            @fragment
            fn fs_main(@location(7) extra: vec4<f32>) -> @location(0) vec4<f32> {
                return extra;
            }
        "#;
        let err = ShaderProgram::build(&pair(VERT, frag)).err().expect("link error");
        assert!(matches!(err, CoreError::ShaderLink(_)));
    }

    #[test]
    fn missing_attribute_is_reported_by_name() {
        let vert = r#"
            struct In {
                @location(3) vPosition: vec3<f32>,
            };
            @vertex
            fn vs_main(v: In) -> @builtin(position) vec4<f32> {
                return vec4<f32>(v.vPosition, 1.0);
            }
        "#;
        let stage = compile_stage(
            &ShaderText::from_source("struct.vert.wgsl", vert),
            ShaderStage::Vertex,
        )
        .expect("valid vertex stage");

        assert_eq!(attribute_location(&stage, POSITION_ATTRIBUTE).unwrap(), 3);
        let err = attribute_location(&stage, TEXCOORD_ATTRIBUTE).unwrap_err();
        assert!(matches!(err, CoreError::MissingAttribute(name) if name == TEXCOORD_ATTRIBUTE));
    }
}
