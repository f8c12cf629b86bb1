//! GLSL sources of the lit pass, the shadow pass and the depth debug view.
//!
//! The `Light` struct layout and field order are part of the interface: lights
//! address their fields as `lights[N].<field>`.

const MAX_LIGHTS_PLACEHOLDER: &str = "{MAX_LIGHTS}";

pub const LIGHTING_VS: &str = r#"#version 330

in vec3 vertexPosition;
in vec2 vertexTexCoord;
in vec3 vertexNormal;
in vec4 vertexTangent;

uniform mat4 mvp;
uniform mat4 matModel;
uniform mat4 matNormal;

out vec3 fragPosition;
out vec2 fragTexCoord;
out vec3 fragNormal;
out mat3 fragTBN;

void main()
{
    fragPosition = vec3(matModel * vec4(vertexPosition, 1.0));
    fragTexCoord = vertexTexCoord;
    fragNormal = normalize(vec3(matNormal * vec4(vertexNormal, 0.0)));

    vec3 tangent = normalize(vec3(matModel * vec4(vertexTangent.xyz, 0.0)));
    tangent = normalize(tangent - dot(tangent, fragNormal) * fragNormal);
    vec3 bitangent = cross(fragNormal, tangent) * vertexTangent.w;
    fragTBN = mat3(tangent, bitangent, fragNormal);

    gl_Position = mvp * vec4(vertexPosition, 1.0);
}
"#;

const LIGHTING_FS_TEMPLATE: &str = r#"#version 330

in vec3 fragPosition;
in vec2 fragTexCoord;
in vec3 fragNormal;
in mat3 fragTBN;

out vec4 finalColor;

struct Light {
    mat4 matrix;
    vec3 position;
    vec3 direction;
    vec3 color;
    float cutoff;
    float radius;
    vec4 mapBounds;
    int shadow;
    int spotlight;
    float spotSoftness;
    int enabled;
};

uniform sampler2D texture0; // diffuse
uniform sampler2D texture1; // specular
uniform sampler2D texture2; // normal
uniform sampler2D texture6; // height
uniform sampler2D shadowMap;
uniform vec4 colDiffuse;

uniform Light lights[{MAX_LIGHTS}];
uniform vec4 ambient;
uniform vec3 viewPos;
uniform vec2 shadowMapTexelSize;

uniform int useSpecularMap;
uniform int useNormalMap;
uniform int useHeightMap;

const float PARALLAX_SCALE = 0.05;

vec2 ParallaxUV(vec2 uv, vec3 viewDir)
{
    vec3 tangentView = normalize(transpose(fragTBN) * viewDir);
    float height = texture(texture6, uv).r;
    return uv - tangentView.xy / max(tangentView.z, 0.1) * (height * PARALLAX_SCALE);
}

float ShadowFactor(int i, vec3 normal, vec3 lightDir)
{
    vec4 lightSpace = lights[i].matrix * vec4(fragPosition, 1.0);
    vec3 proj = (lightSpace.xyz / lightSpace.w) * 0.5 + 0.5;

    if (proj.z > 1.0 || any(lessThan(proj.xy, vec2(0.0))) || any(greaterThan(proj.xy, vec2(1.0))))
    {
        return 1.0;
    }

    vec2 tileMin = lights[i].mapBounds.xy;
    vec2 tileMax = lights[i].mapBounds.xy + lights[i].mapBounds.zw;
    vec2 uv = tileMin + proj.xy * lights[i].mapBounds.zw;
    float bias = max(0.002 * (1.0 - dot(normal, lightDir)), 0.0002);

    float lit = 0.0;
    for (int x = -1; x <= 1; x++)
    {
        for (int y = -1; y <= 1; y++)
        {
            vec2 sampleUV = clamp(uv + vec2(x, y) * shadowMapTexelSize, tileMin, tileMax);
            float depth = texture(shadowMap, sampleUV).r;
            lit += (proj.z - bias > depth) ? 0.0 : 1.0;
        }
    }

    return lit / 9.0;
}

void main()
{
    vec3 viewDir = normalize(viewPos - fragPosition);
    vec2 uv = (useHeightMap != 0) ? ParallaxUV(fragTexCoord, viewDir) : fragTexCoord;

    vec4 albedo = texture(texture0, uv) * colDiffuse;
    vec3 normal = (useNormalMap != 0)
        ? normalize(fragTBN * (texture(texture2, uv).rgb * 2.0 - 1.0))
        : normalize(fragNormal);
    float specularStrength = (useSpecularMap != 0) ? texture(texture1, uv).r : 0.5;

    vec3 lighting = ambient.rgb;

    for (int i = 0; i < {MAX_LIGHTS}; i++)
    {
        if (lights[i].enabled == 0) continue;

        vec3 toLight = lights[i].position - fragPosition;
        float dist = length(toLight);
        vec3 lightDir = toLight / max(dist, 0.0001);

        // radius 0 disables falloff
        float attenuation = 1.0;
        if (lights[i].radius > 0.0)
        {
            float ratio = dist / lights[i].radius;
            attenuation = clamp(1.0 - ratio * ratio, 0.0, 1.0);
        }

        float cone = 1.0;
        if (lights[i].spotlight != 0)
        {
            float theta = dot(lightDir, -lights[i].direction);
            float inner = mix(lights[i].cutoff, 1.0, lights[i].spotSoftness);
            cone = clamp((theta - lights[i].cutoff) / max(inner - lights[i].cutoff, 0.0001), 0.0, 1.0);
        }

        float shadow = (lights[i].shadow != 0) ? ShadowFactor(i, normal, lightDir) : 1.0;

        float diffuse = max(dot(normal, lightDir), 0.0);
        vec3 halfway = normalize(lightDir + viewDir);
        float specular = pow(max(dot(normal, halfway), 0.0), 32.0) * specularStrength;

        lighting += (diffuse + specular) * lights[i].color * attenuation * cone * shadow;
    }

    finalColor = vec4(albedo.rgb * lighting, albedo.a);
}
"#;

pub const SHADOW_VS: &str = r#"#version 330

in vec3 vertexPosition;
in vec2 vertexTexCoord;

uniform mat4 mvp;

out vec2 fragTexCoord;

void main()
{
    fragTexCoord = vertexTexCoord;
    gl_Position = mvp * vec4(vertexPosition, 1.0);
}
"#;

pub const SHADOW_FS: &str = r#"#version 330

in vec2 fragTexCoord;

uniform sampler2D texture0;
uniform vec4 colDiffuse;

void main()
{
    // cut-out geometry doesn't cast
    if (texture(texture0, fragTexCoord).a * colDiffuse.a < 0.1) discard;
}
"#;

pub const DEPTH_DEBUG_VS: &str = r#"#version 330

in vec3 vertexPosition;
in vec2 vertexTexCoord;

uniform mat4 mvp;

out vec2 fragTexCoord;

void main()
{
    fragTexCoord = vertexTexCoord;
    gl_Position = mvp * vec4(vertexPosition, 1.0);
}
"#;

pub const DEPTH_DEBUG_FS: &str = r#"#version 330

in vec2 fragTexCoord;

uniform sampler2D texture0;
uniform float near;
uniform float far;

out vec4 finalColor;

void main()
{
    float z = texture(texture0, fragTexCoord).r * 2.0 - 1.0;
    float linear = (2.0 * near * far) / (far + near - z * (far - near));
    finalColor = vec4(vec3(clamp(linear / far, 0.0, 1.0)), 1.0);
}
"#;

/// Fragment source of the lit pass with a light array of `max_lights` entries.
pub fn lighting_fs(max_lights: usize) -> String {
    LIGHTING_FS_TEMPLATE.replace(MAX_LIGHTS_PLACEHOLDER, &max_lights.to_string())
}
