//! SPM encoder
//!
//! Writes the layout described in [`crate::formats`] verbatim. Nothing is
//! validated, so malformed files can be produced on purpose.

use std::io::Write;

use glam::Vec3;

use super::{MAX_INFLUENCES, MAX_U8_INDEXED_VERTICES, MeshKind, SpmHeader};
use crate::armature::LocRotScale;
use crate::error::Result;
use crate::mesh::{Material, VertexLayout};
use crate::packing::{COLOR_EXPLICIT_MARKER, COLOR_WHITE_MARKER, compress_normal, f32_to_f16};

/// One vertex to encode; fields not present in the layout are skipped
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexDesc {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// None writes the white marker
    pub color: Option<[u8; 3]>,
    pub uv: [f32; 2],
    pub uv2: [f32; 2],
    pub joints: [i16; MAX_INFLUENCES],
    pub weights: [f32; MAX_INFLUENCES],
}

impl VertexDesc {
    pub fn new(position: [f32; 3]) -> Self {
        Self {
            position,
            normal: [0.0, 0.0, 1.0],
            color: None,
            uv: [0.0; 2],
            uv2: [0.0; 2],
            joints: [-1; MAX_INFLUENCES],
            weights: [0.0; MAX_INFLUENCES],
        }
    }

    pub fn with_normal(mut self, normal: [f32; 3]) -> Self {
        self.normal = normal;
        self
    }

    pub fn with_color(mut self, rgb: [u8; 3]) -> Self {
        self.color = Some(rgb);
        self
    }

    pub fn with_uv(mut self, uv: [f32; 2]) -> Self {
        self.uv = uv;
        self
    }

    pub fn with_uv2(mut self, uv2: [f32; 2]) -> Self {
        self.uv2 = uv2;
        self
    }

    pub fn with_skin(
        mut self,
        joints: [i16; MAX_INFLUENCES],
        weights: [f32; MAX_INFLUENCES],
    ) -> Self {
        self.joints = joints;
        self.weights = weights;
        self
    }
}

/// One sub-block: vertices and triangle indices for one material
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubBlockDesc {
    pub material_id: u16,
    pub vertices: Vec<VertexDesc>,
    pub indices: Vec<u16>,
}

/// One armature to encode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArmatureDesc {
    pub joint_used: u16,
    pub joint_names: Vec<String>,
    pub bind: Vec<LocRotScale>,
    pub parents: Vec<i16>,
    pub keyframes: Vec<(u16, Vec<LocRotScale>)>,
}

impl ArmatureDesc {
    /// Single joint, identity bind and one identity keyframe at frame 0
    pub fn single_joint(name: &str) -> Self {
        Self {
            joint_used: 1,
            joint_names: vec![name.to_string()],
            bind: vec![LocRotScale::IDENTITY],
            parents: vec![-1],
            keyframes: vec![(0, vec![LocRotScale::IDENTITY])],
        }
    }
}

/// In-memory description of a whole file
#[derive(Debug, Clone, PartialEq)]
pub struct SpmWriter {
    pub header: SpmHeader,
    /// First and second texture name per material
    pub materials: Vec<[String; 2]>,
    /// Geometry blocks, each a list of sub-blocks
    pub blocks: Vec<Vec<SubBlockDesc>>,
    pub bind_frame: u16,
    /// Written only for skinned meshes
    pub armatures: Vec<ArmatureDesc>,
}

impl SpmWriter {
    pub fn new(kind: MeshKind, flags: u8) -> Self {
        Self {
            header: SpmHeader::new(kind, flags),
            materials: Vec::new(),
            blocks: Vec::new(),
            bind_frame: 0,
            armatures: Vec::new(),
        }
    }

    /// Encode the file to `w`
    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(&self.to_bytes())?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.header.to_bytes());

        out.extend_from_slice(&(self.materials.len() as u16).to_le_bytes());
        for [first, second] in &self.materials {
            push_string(&mut out, first);
            push_string(&mut out, second);
        }

        out.extend_from_slice(&(self.blocks.len() as u16).to_le_bytes());
        for block in &self.blocks {
            out.extend_from_slice(&(block.len() as u16).to_le_bytes());
            for sub_block in block {
                self.push_sub_block(&mut out, sub_block);
            }
        }

        if self.header.kind == MeshKind::Skinned {
            out.push(self.armatures.len() as u8);
            out.extend_from_slice(&self.bind_frame.to_le_bytes());
            for armature in &self.armatures {
                push_armature(&mut out, armature);
            }
        }
        out
    }

    fn layout(&self, material_id: u16) -> VertexLayout {
        let texture_names = self
            .materials
            .get(material_id as usize)
            .cloned()
            .unwrap_or_default();
        let material = Material {
            id: material_id,
            texture_names,
            textures: [None, None],
        };
        VertexLayout::new(&self.header, &material)
    }

    fn push_sub_block(&self, out: &mut Vec<u8>, sub_block: &SubBlockDesc) {
        let layout = self.layout(sub_block.material_id);
        out.extend_from_slice(&(sub_block.vertices.len() as u32).to_le_bytes());
        out.extend_from_slice(&(sub_block.indices.len() as u32).to_le_bytes());
        out.extend_from_slice(&sub_block.material_id.to_le_bytes());

        for vertex in &sub_block.vertices {
            push_vertex(out, vertex, &layout);
        }

        let wide = sub_block.vertices.len() as u32 > MAX_U8_INDEXED_VERTICES;
        for &index in &sub_block.indices {
            if wide {
                out.extend_from_slice(&index.to_le_bytes());
            } else {
                out.push(index as u8);
            }
        }
    }
}

fn push_f32s(out: &mut Vec<u8>, values: &[f32]) {
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

fn push_halves(out: &mut Vec<u8>, values: &[f32]) {
    for &v in values {
        out.extend_from_slice(&f32_to_f16(v).to_le_bytes());
    }
}

/// u8 length prefix; longer names are cut at 255 bytes
fn push_string(out: &mut Vec<u8>, s: &str) {
    let bytes = &s.as_bytes()[..s.len().min(u8::MAX as usize)];
    out.push(bytes.len() as u8);
    out.extend_from_slice(bytes);
}

fn push_vertex(out: &mut Vec<u8>, vertex: &VertexDesc, layout: &VertexLayout) {
    push_f32s(out, &vertex.position);
    if layout.normal {
        let packed = compress_normal(Vec3::from_array(vertex.normal));
        out.extend_from_slice(&packed.to_le_bytes());
    }
    if layout.color {
        match vertex.color {
            Some(rgb) => {
                out.push(COLOR_EXPLICIT_MARKER);
                out.extend_from_slice(&rgb);
            }
            None => out.push(COLOR_WHITE_MARKER),
        }
    }
    if layout.uv_one {
        push_halves(out, &vertex.uv);
        if layout.uv_two {
            push_halves(out, &vertex.uv2);
        }
        if layout.tangent {
            out.extend_from_slice(&[0; 4]);
        }
    }
    if layout.skinned {
        for joint in vertex.joints {
            out.extend_from_slice(&joint.to_le_bytes());
        }
        push_halves(out, &vertex.weights);
    }
}

/// Inverse of [`LocRotScale::read`]: quaternion x, y and z are negated
fn push_lrs(out: &mut Vec<u8>, lrs: &LocRotScale) {
    let q = lrs.rotation;
    push_f32s(out, &lrs.translation.to_array());
    push_f32s(out, &[-q.x, -q.y, -q.z, q.w]);
    push_f32s(out, &lrs.scale.to_array());
}

fn push_armature(out: &mut Vec<u8>, armature: &ArmatureDesc) {
    out.extend_from_slice(&armature.joint_used.to_le_bytes());
    out.extend_from_slice(&(armature.joint_names.len() as u16).to_le_bytes());
    for name in &armature.joint_names {
        push_string(out, name);
    }
    for lrs in &armature.bind {
        push_lrs(out, lrs);
    }
    for parent in &armature.parents {
        out.extend_from_slice(&parent.to_le_bytes());
    }
    out.extend_from_slice(&(armature.keyframes.len() as u16).to_le_bytes());
    for (frame, pose) in &armature.keyframes {
        out.extend_from_slice(&frame.to_le_bytes());
        for lrs in pose {
            push_lrs(out, lrs);
        }
    }
}
