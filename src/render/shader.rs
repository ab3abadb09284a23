//! WGSL source composed per vertex layout. Attributes the mesh does not
//! carry never appear in the shader, so one generator replaces a
//! per-combination family of shader files.

use crate::light::MAX_LIGHTS;
use crate::object::VertexLayout;

pub(crate) fn shader_source(layout: VertexLayout) -> String {
    let mut source = String::new();

    source.push_str(
        "struct LightRecord {\n\
         \x20   position: vec4<f32>,\n\
         \x20   ambient: vec4<f32>,\n\
         \x20   diffuse: vec4<f32>,\n\
         \x20   specular: vec4<f32>,\n\
         \x20   spot: vec4<f32>,\n\
         \x20   params: vec4<f32>,\n\
         }\n\n",
    );
    source.push_str(&format!(
        "struct FrameUniform {{\n\
         \x20   view: mat4x4<f32>,\n\
         \x20   projection: mat4x4<f32>,\n\
         \x20   camera_position: vec4<f32>,\n\
         \x20   global_ambient: vec4<f32>,\n\
         \x20   light_count: u32,\n\
         \x20   use_light: u32,\n\
         \x20   pad0: u32,\n\
         \x20   pad1: u32,\n\
         \x20   lights: array<LightRecord, {MAX_LIGHTS}>,\n\
         }}\n\n",
    ));
    source.push_str(
        "struct ObjectUniform {\n\
         \x20   model: mat4x4<f32>,\n\
         \x20   normal: mat3x4<f32>,\n\
         \x20   emission: vec4<f32>,\n\
         \x20   ambient: vec4<f32>,\n\
         \x20   diffuse: vec4<f32>,\n\
         \x20   specular: vec4<f32>,\n\
         \x20   params: vec4<f32>,\n\
         }\n\n\
         @group(0) @binding(0)\n\
         var<uniform> frame: FrameUniform;\n\n\
         @group(1) @binding(0)\n\
         var<uniform> object: ObjectUniform;\n\n",
    );
    if layout.has_uvs {
        source.push_str(
            "@group(1) @binding(1)\n\
             var base_texture: texture_2d<f32>;\n\n\
             @group(1) @binding(2)\n\
             var base_sampler: sampler;\n\n",
        );
    }

    source.push_str("struct VertexInput {\n    @location(0) position: vec3<f32>,\n");
    if layout.has_normals {
        source.push_str("    @location(1) normal: vec3<f32>,\n");
    }
    if layout.has_uvs {
        source.push_str("    @location(2) uv: vec2<f32>,\n");
    }
    source.push_str("}\n\n");

    source.push_str(
        "struct VertexOutput {\n\
         \x20   @builtin(position) clip_position: vec4<f32>,\n\
         \x20   @location(0) world_pos: vec3<f32>,\n\
         \x20   @location(1) normal: vec3<f32>,\n\
         \x20   @location(2) uv: vec2<f32>,\n\
         }\n\n",
    );

    source.push_str(
        "@vertex\n\
         fn vs_main(input: VertexInput) -> VertexOutput {\n\
         \x20   var out: VertexOutput;\n\
         \x20   let world_position = object.model * vec4<f32>(input.position, 1.0);\n\
         \x20   out.clip_position = frame.projection * frame.view * world_position;\n\
         \x20   out.world_pos = world_position.xyz;\n",
    );
    if layout.has_normals {
        source.push_str(
            "    let world_normal = mat3x3<f32>(\n\
             \x20       object.normal[0].xyz,\n\
             \x20       object.normal[1].xyz,\n\
             \x20       object.normal[2].xyz\n\
             \x20   ) * input.normal;\n\
             \x20   out.normal = normalize(world_normal);\n",
        );
    } else {
        source.push_str("    out.normal = vec3<f32>(0.0, 0.0, 1.0);\n");
    }
    if layout.has_uvs {
        source.push_str("    out.uv = input.uv;\n");
    } else {
        source.push_str("    out.uv = vec2<f32>(0.0, 0.0);\n");
    }
    source.push_str("    return out;\n}\n\n");

    source.push_str(
        "@fragment\n\
         fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {\n\
         \x20   var base = object.diffuse;\n",
    );
    if layout.has_uvs {
        source.push_str(
            "    let texel = textureSample(base_texture, base_sampler, input.uv);\n\
             \x20   if (object.params.y > 0.5) {\n\
             \x20       base = base * texel;\n\
             \x20   }\n",
        );
    }
    if layout.has_normals {
        source.push_str(
            "    if (frame.use_light == 0u) {\n\
             \x20       return vec4<f32>(base.rgb, base.a);\n\
             \x20   }\n\
             \x20   var color = object.emission + object.ambient * frame.global_ambient;\n\
             \x20   let n = normalize(input.normal);\n\
             \x20   let view_dir = normalize(frame.camera_position.xyz - input.world_pos);\n\
             \x20   for (var i = 0u; i < frame.light_count; i = i + 1u) {\n\
             \x20       let light = frame.lights[i];\n\
             \x20       if (light.params.z < 0.5) {\n\
             \x20           continue;\n\
             \x20       }\n\
             \x20       var light_dir = vec3<f32>(0.0, 0.0, 1.0);\n\
             \x20       var attenuation = 1.0;\n\
             \x20       if (light.position.w != 0.0) {\n\
             \x20           let to_light = light.position.xyz - input.world_pos;\n\
             \x20           let dist = length(to_light);\n\
             \x20           light_dir = to_light / max(dist, 1e-4);\n\
             \x20           attenuation = clamp(1.0 - dist / max(light.params.y, 1e-4), 0.0, 1.0);\n\
             \x20       } else {\n\
             \x20           light_dir = normalize(-light.position.xyz);\n\
             \x20       }\n\
             \x20       var cone = 1.0;\n\
             \x20       if (light.spot.w < 180.0) {\n\
             \x20           let spot_cos = dot(normalize(-light_dir), normalize(light.spot.xyz));\n\
             \x20           let outer = cos(radians(light.spot.w));\n\
             \x20           let inner = cos(radians(max(light.spot.w - light.params.x, 0.0)));\n\
             \x20           cone = clamp((spot_cos - outer) / max(inner - outer, 1e-4), 0.0, 1.0);\n\
             \x20       }\n\
             \x20       let n_dot_l = max(dot(n, light_dir), 0.0);\n\
             \x20       var contribution = object.ambient * light.ambient + base * light.diffuse * n_dot_l;\n\
             \x20       if (n_dot_l > 0.0 && object.params.x > 0.0) {\n\
             \x20           let reflect_dir = reflect(-light_dir, n);\n\
             \x20           let r_dot_v = max(dot(reflect_dir, view_dir), 0.0);\n\
             \x20           contribution = contribution + object.specular * light.specular * pow(r_dot_v, object.params.x);\n\
             \x20       }\n\
             \x20       color = color + attenuation * cone * contribution;\n\
             \x20   }\n\
             \x20   return vec4<f32>(color.rgb, base.a);\n}\n",
        );
    } else {
        source.push_str("    return vec4<f32>(base.rgb, base.a);\n}\n");
    }

    source
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_only_shader_is_unlit_and_untextured() {
        let source = shader_source(VertexLayout::POSITIONS_ONLY);
        assert!(!source.contains("@location(1) normal: vec3<f32>"));
        assert!(!source.contains("textureSample"));
        assert!(!source.contains("frame.lights[i]"));
    }

    #[test]
    fn full_layout_shader_samples_and_lights() {
        let source = shader_source(VertexLayout {
            has_normals: true,
            has_uvs: true,
        });
        assert!(source.contains("@location(1) normal: vec3<f32>"));
        assert!(source.contains("@location(2) uv: vec2<f32>"));
        assert!(source.contains("textureSample(base_texture, base_sampler, input.uv)"));
        assert!(source.contains(&format!("array<LightRecord, {MAX_LIGHTS}>")));
    }

    #[test]
    fn uv_only_shader_has_no_lighting_loop() {
        let source = shader_source(VertexLayout {
            has_normals: false,
            has_uvs: true,
        });
        assert!(source.contains("textureSample"));
        assert!(!source.contains("frame.light_count"));
    }
}
