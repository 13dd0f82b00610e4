use bytemuck::{Pod, Zeroable};
use crt_core::ShaderUniforms;

/// Full-window CRT composite. Mirrors `crt_core::composite::shade` step for
/// step; the fragment position is mapped onto the surface rectangle so the
/// bars around a letterboxed display stay black.
pub const COMPOSITE_SHADER: &str = r#"
struct CompositeUniforms {
    surface: vec4<f32>,
    aspect: f32,
    distortion_amount: f32,
    bloom_strength: f32,
    elapsed_time: f32,
    aberration: f32,
    brightness_flicker: f32,
    _pad: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
};

@group(0) @binding(0)
var video_texture: texture_2d<f32>;
@group(0) @binding(1)
var video_sampler: sampler;
@group(0) @binding(2)
var ui_texture: texture_2d<f32>;
@group(0) @binding(3)
var ui_sampler: sampler;
@group(0) @binding(4)
var<uniform> params: CompositeUniforms;

const CORNER_RADIUS: f32 = 0.12;
const BLOOM_RADIUS: f32 = 0.005;
const BLOOM_MIX: f32 = 0.3;
const VIDEO_DIM: f32 = 0.5;
const GLITCH_AMPLITUDE: f32 = 0.002;
const GLOW_RADIUS: f32 = 0.02;
const LUMA: vec3<f32> = vec3<f32>(0.299, 0.587, 0.114);
const GLOW_TINT: vec3<f32> = vec3<f32>(0.6, 0.8, 1.0);

@vertex
fn vs_main(@location(0) position: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(position, 0.0, 1.0);
    return out;
}

fn rounded_rect(p: vec2<f32>, size: vec2<f32>, radius: f32) -> f32 {
    let d = abs(p) - size * 0.5 + vec2<f32>(radius);
    return length(max(d, vec2<f32>(0.0))) - radius;
}

fn noise(p: vec2<f32>) -> f32 {
    return fract(sin(dot(p, vec2<f32>(12.9898, 78.233))) * 43758.5453);
}

fn video_at(uv: vec2<f32>) -> vec4<f32> {
    return textureSampleLevel(video_texture, video_sampler, clamp(uv, vec2<f32>(0.0), vec2<f32>(1.0)), 0.0);
}

fn ui_at(uv: vec2<f32>) -> vec4<f32> {
    return textureSampleLevel(ui_texture, ui_sampler, clamp(uv, vec2<f32>(0.0), vec2<f32>(1.0)), 0.0);
}

fn aberrated(uv: vec2<f32>) -> vec3<f32> {
    let dir = uv - vec2<f32>(0.5);
    let dist = length(dir);
    var offset = vec2<f32>(0.0);
    if dist > 0.0 {
        offset = dir / dist * params.aberration * dist;
    }
    return vec3<f32>(video_at(uv + offset).r, video_at(uv).g, video_at(uv - offset).b);
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let size = params.surface.zw;
    if size.x <= 0.0 || size.y <= 0.0 {
        discard;
    }
    let uv = (input.position.xy - params.surface.xy) / size;

    var p = uv * 2.0 - vec2<f32>(1.0);
    p.x = p.x * params.aspect;
    let r = length(p);
    var d = p;
    if r > 0.0 {
        d = p * ((r + params.distortion_amount * r * r * r) / r);
    }
    if rounded_rect(d, vec2<f32>(params.aspect * 2.0, 2.0), CORNER_RADIUS) > 0.0 {
        discard;
    }
    let final_uv = vec2<f32>(d.x / params.aspect, d.y) * 0.5 + vec2<f32>(0.5);
    if any(final_uv < vec2<f32>(0.0)) || any(final_uv > vec2<f32>(1.0)) {
        discard;
    }

    let base = aberrated(final_uv);
    var bloom = vec3<f32>(0.0);
    for (var i = 0; i < 8; i = i + 1) {
        let angle = f32(i) * 0.785398;
        bloom = bloom + aberrated(final_uv + vec2<f32>(cos(angle), sin(angle)) * BLOOM_RADIUS) * 0.125;
    }
    let video_color = mix(base, bloom, params.bloom_strength * BLOOM_MIX) * VIDEO_DIM;

    let t = params.elapsed_time;
    let glitch = vec2<f32>(
        noise(vec2<f32>(final_uv.y * 100.0, t * 35.0)) - 0.5,
        noise(vec2<f32>(final_uv.x * 100.0 + 1000.0, t * 25.0)) - 0.5,
    ) * GLITCH_AMPLITUDE;
    let glitch_uv = final_uv + glitch;

    let text = ui_at(glitch_uv);
    let alpha = smoothstep(0.15, 0.65, dot(text.rgb, LUMA));
    var glow = 0.0;
    glow = glow + dot(ui_at(glitch_uv + vec2<f32>(GLOW_RADIUS, 0.0)).rgb, LUMA) * 0.25;
    glow = glow + dot(ui_at(glitch_uv - vec2<f32>(GLOW_RADIUS, 0.0)).rgb, LUMA) * 0.25;
    glow = glow + dot(ui_at(glitch_uv + vec2<f32>(0.0, GLOW_RADIUS)).rgb, LUMA) * 0.25;
    glow = glow + dot(ui_at(glitch_uv - vec2<f32>(0.0, GLOW_RADIUS)).rgb, LUMA) * 0.25;
    let text_color = mix(vec3<f32>(1.0), GLOW_TINT, glow);

    var color = mix(video_color, text_color, alpha);
    color = color * (0.95 + 0.1 * sin(t * 20.0 + (1.0 - final_uv.y) * 50.0));
    let flicker = params.brightness_flicker;
    color = color * (1.0 - flicker + flicker * sin(t * 100.0));
    return vec4<f32>(clamp(color, vec3<f32>(0.0), vec3<f32>(1.0)), 1.0);
}
"#;

/// Uniform block layout shared with `CompositeUniforms` in the shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CompositeUniforms {
    pub surface: [f32; 4],
    pub aspect: f32,
    pub distortion_amount: f32,
    pub bloom_strength: f32,
    pub elapsed_time: f32,
    pub aberration: f32,
    pub brightness_flicker: f32,
    pub _pad: [f32; 2],
}

impl From<&ShaderUniforms> for CompositeUniforms {
    fn from(uniforms: &ShaderUniforms) -> Self {
        Self {
            surface: [
                uniforms.surface_origin.x,
                uniforms.surface_origin.y,
                uniforms.resolution.x,
                uniforms.resolution.y,
            ],
            aspect: uniforms.aspect,
            distortion_amount: uniforms.distortion_amount,
            bloom_strength: uniforms.bloom_strength,
            elapsed_time: uniforms.elapsed_time,
            aberration: uniforms.aberration,
            brightness_flicker: uniforms.brightness_flicker,
            _pad: [0.0; 2],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
}

pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-1.0, 1.0],
    },
    QuadVertex {
        position: [1.0, 1.0],
    },
    QuadVertex {
        position: [-1.0, -1.0],
    },
    QuadVertex {
        position: [1.0, -1.0],
    },
];

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];
