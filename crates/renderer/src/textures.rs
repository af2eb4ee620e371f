//! GPU textures for the water shader: skybox cube map and bump map.
//!
//! A texture unit `u` occupies bindings `2u` (texture) and `2u + 1`
//! (sampler) of the texture bind group.

use asset::{CubeFace, CubeMapData, TextureData};
use wgpu::{
    AddressMode, BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry,
    BindingType, Device, Extent3d, FilterMode, Origin3d, Queue, SamplerBindingType,
    SamplerDescriptor, ShaderStages, TexelCopyBufferLayout, TexelCopyTextureInfo, Texture,
    TextureAspect, TextureDescriptor, TextureDimension, TextureFormat, TextureSampleType,
    TextureUsages, TextureViewDescriptor, TextureViewDimension,
};

/// Unit of `SkyboxTexture`.
pub const SKYBOX_UNIT: u32 = 0;
/// Unit of `BumpMapTexture`.
pub const BUMP_MAP_UNIT: u32 = 1;

/// Both textures are sampled as stored bytes, matching a UNORM target.
pub const SKYBOX_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;
pub const BUMP_MAP_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

#[inline]
pub const fn texture_binding(unit: u32) -> u32 {
    unit * 2
}

#[inline]
pub const fn sampler_binding(unit: u32) -> u32 {
    unit * 2 + 1
}

pub struct WaterTextures {
    skybox: Texture,
    bump_map: Texture,
    pub layout: BindGroupLayout,
    pub bind_group: BindGroup,
}

impl WaterTextures {
    /// Upload both textures and fix their units in one bind group.
    pub fn new(
        device: &Device,
        queue: &Queue,
        bump_map: &TextureData,
        skybox: &CubeMapData,
    ) -> Self {
        let skybox_tex = upload_cube(device, queue, skybox);
        let bump_tex = upload_2d(device, queue, bump_map);

        let skybox_view = skybox_tex.create_view(&TextureViewDescriptor {
            label: Some("SkyboxTexture view"),
            dimension: Some(TextureViewDimension::Cube),
            array_layer_count: Some(6),
            ..Default::default()
        });
        let bump_view = bump_tex.create_view(&TextureViewDescriptor::default());

        // Cube faces clamp, the bump map tiles.
        let skybox_sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("SkyboxSampler"),
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            address_mode_w: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            ..Default::default()
        });
        let bump_sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("BumpMapSampler"),
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            ..Default::default()
        });

        let layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Water textures BGL"),
            entries: &[
                texture_entry(SKYBOX_UNIT, TextureViewDimension::Cube),
                sampler_entry(SKYBOX_UNIT),
                texture_entry(BUMP_MAP_UNIT, TextureViewDimension::D2),
                sampler_entry(BUMP_MAP_UNIT),
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Water textures BG"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: texture_binding(SKYBOX_UNIT),
                    resource: wgpu::BindingResource::TextureView(&skybox_view),
                },
                wgpu::BindGroupEntry {
                    binding: sampler_binding(SKYBOX_UNIT),
                    resource: wgpu::BindingResource::Sampler(&skybox_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: texture_binding(BUMP_MAP_UNIT),
                    resource: wgpu::BindingResource::TextureView(&bump_view),
                },
                wgpu::BindGroupEntry {
                    binding: sampler_binding(BUMP_MAP_UNIT),
                    resource: wgpu::BindingResource::Sampler(&bump_sampler),
                },
            ],
        });

        log::info!(
            "Textures uploaded: skybox {0}x{0}x6 (unit {SKYBOX_UNIT}), bump map {1}x{2} (unit {BUMP_MAP_UNIT})",
            skybox.size(),
            bump_map.width,
            bump_map.height
        );

        Self {
            skybox: skybox_tex,
            bump_map: bump_tex,
            layout,
            bind_group,
        }
    }

    pub fn destroy(&self) {
        self.skybox.destroy();
        self.bump_map.destroy();
    }
}

fn texture_entry(unit: u32, view_dimension: TextureViewDimension) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding: texture_binding(unit),
        visibility: ShaderStages::FRAGMENT,
        ty: BindingType::Texture {
            sample_type: TextureSampleType::Float { filterable: true },
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(unit: u32) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding: sampler_binding(unit),
        visibility: ShaderStages::FRAGMENT,
        ty: BindingType::Sampler(SamplerBindingType::Filtering),
        count: None,
    }
}

fn write_layer(queue: &Queue, texture: &Texture, layer: u32, data: &TextureData) {
    queue.write_texture(
        TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
            aspect: TextureAspect::All,
        },
        &data.data,
        TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(data.width * data.bytes_per_pixel()),
            rows_per_image: Some(data.height),
        },
        Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        },
    );
}

fn upload_2d(device: &Device, queue: &Queue, data: &TextureData) -> Texture {
    let texture = device.create_texture(&TextureDescriptor {
        label: Some("BumpMapTexture"),
        size: Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: BUMP_MAP_FORMAT,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });
    write_layer(queue, &texture, 0, data);
    texture
}

fn upload_cube(device: &Device, queue: &Queue, cube: &CubeMapData) -> Texture {
    let size = cube.size();
    let texture = device.create_texture(&TextureDescriptor {
        label: Some("SkyboxTexture"),
        size: Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 6,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: SKYBOX_FORMAT,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });
    for face in CubeFace::ALL {
        write_layer(queue, &texture, face.layer(), &cube.faces[face.layer() as usize]);
    }
    texture
}
