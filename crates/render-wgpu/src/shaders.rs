/// Bindings shared by every scene pipeline: the frame block in group 0 and
/// the per-node block in group 1.
const SCENE_COMMON: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    camera: vec4<f32>,
    fog: vec4<f32>,
    fog_range: vec4<f32>,
};

struct Node {
    model: mat4x4<f32>,
    m0: vec4<f32>,
    m1: vec4<f32>,
    m2: vec4<f32>,
    m3: vec4<f32>,
    m4: vec4<f32>,
    m5: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

@group(1) @binding(0)
var<uniform> node: Node;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) local_position: vec3<f32>,
};

fn transform_vertex(vertex: VertexInput) -> VertexOutput {
    let world = node.model * vec4<f32>(vertex.position, 1.0);
    var out: VertexOutput;
    out.clip_position = frame.view_proj * world;
    out.world_position = world.xyz;
    out.world_normal = normalize((node.model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.local_position = vertex.position;
    return out;
}

fn apply_fog(color: vec3<f32>, world_position: vec3<f32>) -> vec3<f32> {
    let distance = length(world_position - frame.camera.xyz);
    let amount = clamp(
        (distance - frame.fog.w) / max(frame.fog_range.x - frame.fog.w, 0.0001),
        0.0,
        1.0,
    );
    return mix(color, frame.fog.rgb, amount);
}
"#;

const TERRAIN_BODY: &str = r#"
fn wave_height(p: vec2<f32>, t: f32) -> f32 {
    let wave1 = sin(p.x * 0.05 + t * 0.3) * cos(p.y * 0.05 + t * 0.25) * 0.3;
    let wave2 = sin(p.x * 0.12 + t * 0.2) * cos(p.y * 0.08 + t * 0.3) * 0.2;
    return wave1 + wave2;
}

fn ripple_noise(p: vec2<f32>, t: f32) -> f32 {
    return sin(p.x * 10.0 + t) * cos(p.y * 10.0 + t * 0.8) * 0.5 + 0.5;
}

struct TerrainOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) height: f32,
};

@vertex
fn vs_terrain(vertex: VertexInput) -> TerrainOutput {
    var world = node.model * vec4<f32>(vertex.position, 1.0);
    let height = world.y;
    let water_level = node.m0.w;
    if (height < water_level) {
        world.y = height + wave_height(world.xz, frame.camera.w);
    }
    var out: TerrainOutput;
    out.clip_position = frame.view_proj * world;
    out.world_position = world.xyz;
    out.world_normal = normalize((node.model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.height = height;
    return out;
}

@fragment
fn fs_terrain(in: TerrainOutput) -> @location(0) vec4<f32> {
    let t = frame.camera.w;
    let water_level = node.m0.w;
    let grass_level = node.m1.w;
    let rock_level = node.m2.w;
    let snow_level = node.m3.w;
    let light = normalize(node.m5.xyz);
    let n = normalize(in.world_normal);
    let h = in.height;

    var color: vec3<f32>;
    var lighting: f32;
    if (h < water_level) {
        let wave = wave_height(in.world_position.xz, t);
        let ripple = ripple_noise(in.world_position.xz / 20.0 + vec2<f32>(t * 0.1), t) * 0.1;
        let depth = clamp((water_level - h) / max(abs(water_level), 0.0001), 0.0, 1.0);
        color = mix(node.m0.rgb, node.m1.rgb, depth * 0.5) + vec3<f32>(ripple);
        let foam = smoothstep(water_level - 0.3, water_level - 0.1, h + wave);
        color = mix(color, vec3<f32>(0.9, 0.95, 1.0), foam * 0.3);
        let sparkle = ripple_noise(in.world_position.xz / 40.0 + vec2<f32>(t * 0.4), t);
        lighting = max(dot(n, light), 0.6) + 0.5 + sparkle * 0.2;
    } else {
        if (h < grass_level) {
            color = node.m2.rgb;
        } else if (h < rock_level) {
            color = mix(node.m2.rgb, node.m3.rgb, (h - grass_level) / (rock_level - grass_level));
        } else if (h < snow_level) {
            color = mix(node.m3.rgb, node.m4.rgb, (h - rock_level) / (snow_level - rock_level));
        } else {
            color = node.m4.rgb;
        }
        lighting = max(dot(n, light), 0.5) + 0.3;
    }
    return vec4<f32>(apply_fog(color * lighting, in.world_position), 1.0);
}
"#;

const SKY_BODY: &str = r#"
@vertex
fn vs_sky(vertex: VertexInput) -> VertexOutput {
    return transform_vertex(vertex);
}

@fragment
fn fs_sky(in: VertexOutput) -> @location(0) vec4<f32> {
    let h = normalize(in.local_position + vec3<f32>(0.0, node.m0.w, 0.0)).y;
    let amount = max(pow(max(h, 0.0), node.m1.w), 0.0);
    return vec4<f32>(mix(node.m1.rgb, node.m0.rgb, amount), 1.0);
}
"#;

const CLOUD_BODY: &str = r#"
@vertex
fn vs_cloud(vertex: VertexInput) -> VertexOutput {
    return transform_vertex(vertex);
}

@fragment
fn fs_cloud(in: VertexOutput) -> @location(0) vec4<f32> {
    let light = normalize(vec3<f32>(0.5, 1.0, 0.5));
    let shade = 0.85 + 0.15 * max(dot(normalize(in.world_normal), light), 0.0);
    return vec4<f32>(node.m0.rgb * shade, node.m0.w);
}
"#;

const INK_BODY: &str = r#"
@vertex
fn vs_ink(vertex: VertexInput) -> VertexOutput {
    return transform_vertex(vertex);
}

@fragment
fn fs_ink(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(node.m0.rgb, 1.0);
}
"#;

const NORMAL_BODY: &str = r#"
@vertex
fn vs_normal(vertex: VertexInput) -> VertexOutput {
    return transform_vertex(vertex);
}

@fragment
fn fs_normal(in: VertexOutput) -> @location(0) vec4<f32> {
    let view_normal = normalize((frame.view * vec4<f32>(in.world_normal, 0.0)).xyz);
    return vec4<f32>(view_normal * 0.5 + 0.5, 1.0);
}
"#;

/// Full-screen pencil pass over the colour and normal targets.
pub const PENCIL_SHADER: &str = r#"
struct SketchParams {
    resolution: vec2<f32>,
    texel: vec2<f32>,
    ink: vec4<f32>,
    edges: vec4<f32>,
    grain: vec4<f32>,
    jitter: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> params: SketchParams;
@group(0) @binding(1)
var color_texture: texture_2d<f32>;
@group(0) @binding(2)
var normal_texture: texture_2d<f32>;
@group(0) @binding(3)
var noise_texture: texture_2d<f32>;
@group(0) @binding(4)
var clamp_sampler: sampler;
@group(0) @binding(5)
var repeat_sampler: sampler;

struct FullscreenOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_fullscreen(@builtin(vertex_index) index: u32) -> FullscreenOutput {
    let corner = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: FullscreenOutput;
    out.clip_position = vec4<f32>(corner * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(corner.x, 1.0 - corner.y);
    return out;
}

fn hash(p: vec2<f32>) -> f32 {
    return fract(sin(dot(p, vec2<f32>(127.1, 311.7))) * 43758.5453123);
}

fn value_noise(p: vec2<f32>) -> f32 {
    let i = floor(p);
    let f = p - i;
    let a = hash(i);
    let b = hash(i + vec2<f32>(1.0, 0.0));
    let c = hash(i + vec2<f32>(0.0, 1.0));
    let d = hash(i + vec2<f32>(1.0, 1.0));
    let u = f * f * (3.0 - 2.0 * f);
    return a + (b - a) * u.x + (c - a) * u.y * (1.0 - u.x) + (d - b) * u.x * u.y;
}

fn luminance(c: vec3<f32>) -> f32 {
    return (c.r + c.g + c.b) / 3.0;
}

fn tap(uv: vec2<f32>, frag: vec2<f32>, offset: vec2<f32>) -> f32 {
    let cutoff = params.jitter.x;
    let raw = textureSampleLevel(noise_texture, repeat_sampler, (frag + offset) / params.jitter.w, 0.0).r;
    let jitter = (clamp(raw, 0.0, cutoff) / cutoff - 0.5 / cutoff) * params.jitter.y;
    let at = uv + offset * params.texel;
    let color = textureSampleLevel(color_texture, clamp_sampler, at, 0.0).rgb;
    let normal = textureSampleLevel(normal_texture, clamp_sampler, at + vec2<f32>(jitter), 0.0).rgb;
    let modulation = (value_noise(frag * params.grain.w) * 2.0 - 1.0) * params.jitter.z;
    return luminance(color) + luminance(normal) * params.edges.w * modulation;
}

@fragment
fn fs_pencil(in: FullscreenOutput) -> @location(0) vec4<f32> {
    let frag = in.clip_position.xy;
    var g: array<f32, 9>;
    for (var row = 0; row < 3; row++) {
        for (var col = 0; col < 3; col++) {
            let offset = vec2<f32>(f32(col - 1), f32(row - 1));
            g[row * 3 + col] = tap(in.uv, frag, offset);
        }
    }
    let gx = -g[0] - 2.0 * g[3] - g[6] + g[2] + 2.0 * g[5] + g[8];
    let gy = -g[0] - 2.0 * g[1] - g[2] + g[6] + 2.0 * g[7] + g[8];
    let magnitude = sqrt(gx * gx + gy * gy);

    if (smoothstep(params.edges.x, params.edges.y, magnitude) > params.edges.z) {
        return params.ink;
    }
    let base = textureSampleLevel(color_texture, clamp_sampler, in.uv, 0.0).rgb;
    let grain = value_noise(frag * params.grain.x) * params.grain.y + params.grain.z;
    return vec4<f32>(base * grain, 1.0);
}
"#;

/// Scene-pass shader modules, one per material pipeline.
pub fn terrain_shader() -> String {
    [SCENE_COMMON, TERRAIN_BODY].concat()
}

pub fn sky_shader() -> String {
    [SCENE_COMMON, SKY_BODY].concat()
}

pub fn cloud_shader() -> String {
    [SCENE_COMMON, CLOUD_BODY].concat()
}

pub fn ink_shader() -> String {
    [SCENE_COMMON, INK_BODY].concat()
}

pub fn normal_shader() -> String {
    [SCENE_COMMON, NORMAL_BODY].concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_shaders_share_bindings() {
        for source in [
            terrain_shader(),
            sky_shader(),
            cloud_shader(),
            ink_shader(),
            normal_shader(),
        ] {
            assert!(source.contains("var<uniform> frame: Frame"));
            assert!(source.contains("@group(1) @binding(0)"));
        }
    }

    #[test]
    fn pencil_shader_declares_every_binding() {
        for binding in 0..6 {
            assert!(PENCIL_SHADER.contains(&format!("@binding({binding})")));
        }
        assert!(PENCIL_SHADER.contains("fn fs_pencil"));
    }
}
