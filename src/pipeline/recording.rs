use crate::core::framebuffer::DepthFunc;
use crate::error::{RenderError, Result};
use crate::io::image::DecodedImage;
use crate::pipeline::backend::{
    DrawCall, GraphicsBackend, MeshHandle, Program, TextureHandle, VertexData,
};
use crate::pipeline::uniforms::UniformValue;
use nalgebra::Vector3;

/// One call received by a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    UploadMesh {
        mesh: MeshHandle,
        vertex_count: usize,
        index_count: Option<usize>,
    },
    UploadTexture(TextureHandle),
    UploadCubemap(TextureHandle),
    Clear(Vector3<f32>),
    UseProgram(Program),
    SetUniform {
        program: Program,
        name: String,
        value: UniformValue,
    },
    BindTexture {
        unit: u32,
        texture: TextureHandle,
    },
    SetDepthFunc(DepthFunc),
    Draw {
        program: Program,
        mesh: MeshHandle,
        call: DrawCall,
        depth_func: DepthFunc,
    },
}

/// Backend that draws nothing and logs every command in order.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub commands: Vec<Command>,
    program: Option<Program>,
    depth_func: DepthFunc,
    meshes: usize,
    textures: usize,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded so far, then forgets them.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn draws(&self) -> impl Iterator<Item = (usize, &Command)> {
        self.commands
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, Command::Draw { .. }))
    }

    /// Index of the last write to `name` on `program`.
    pub fn last_uniform_write(&self, program: Program, name: &str) -> Option<usize> {
        self.commands.iter().rposition(|c| {
            matches!(c, Command::SetUniform { program: p, name: n, .. } if *p == program && n == name)
        })
    }

    /// Value of the last write to `name` on `program`.
    pub fn uniform(&self, program: Program, name: &str) -> Option<UniformValue> {
        self.last_uniform_write(program, name)
            .and_then(|i| match &self.commands[i] {
                Command::SetUniform { value, .. } => Some(*value),
                _ => None,
            })
    }

    fn current_program(&self) -> Program {
        self.program.unwrap_or(Program::Phong)
    }

    fn next_texture(&mut self) -> TextureHandle {
        self.textures += 1;
        TextureHandle(self.textures - 1)
    }
}

impl GraphicsBackend for RecordingBackend {
    fn upload_mesh(&mut self, data: &VertexData<'_>) -> Result<MeshHandle> {
        let stride = data.layout.stride;
        if stride == 0 || data.bytes.len() % stride != 0 {
            return Err(RenderError::VertexBuffer {
                len: data.bytes.len(),
                stride,
            });
        }
        let mesh = MeshHandle(self.meshes);
        self.meshes += 1;
        self.commands.push(Command::UploadMesh {
            mesh,
            vertex_count: data.bytes.len() / stride,
            index_count: data.indices.map(|i| i.len()),
        });
        Ok(mesh)
    }

    fn upload_texture(&mut self, _image: &DecodedImage) -> TextureHandle {
        let handle = self.next_texture();
        self.commands.push(Command::UploadTexture(handle));
        handle
    }

    fn upload_cubemap(&mut self, _faces: &[DecodedImage; 6]) -> TextureHandle {
        let handle = self.next_texture();
        self.commands.push(Command::UploadCubemap(handle));
        handle
    }

    fn clear(&mut self, color: Vector3<f32>) {
        self.commands.push(Command::Clear(color));
    }

    fn use_program(&mut self, program: Program) {
        self.program = Some(program);
        self.commands.push(Command::UseProgram(program));
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        let program = self.current_program();
        self.commands.push(Command::SetUniform {
            program,
            name: name.to_string(),
            value,
        });
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.commands.push(Command::BindTexture { unit, texture });
    }

    fn depth_func(&self) -> DepthFunc {
        self.depth_func
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        self.depth_func = func;
        self.commands.push(Command::SetDepthFunc(func));
    }

    fn draw(&mut self, mesh: MeshHandle, call: DrawCall) {
        let program = self.current_program();
        self.commands.push(Command::Draw {
            program,
            mesh,
            call,
            depth_func: self.depth_func,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::backend::DepthFuncGuard;

    #[test]
    fn guard_restores_previous_depth_func() {
        let mut backend = RecordingBackend::new();
        {
            let mut guarded = DepthFuncGuard::new(&mut backend, DepthFunc::LessEqual);
            guarded.draw(MeshHandle(0), DrawCall::Arrays { first: 0, count: 36 });
        }
        assert_eq!(backend.depth_func(), DepthFunc::Less);
        assert_eq!(
            backend.commands,
            vec![
                Command::SetDepthFunc(DepthFunc::LessEqual),
                Command::Draw {
                    program: Program::Phong,
                    mesh: MeshHandle(0),
                    call: DrawCall::Arrays { first: 0, count: 36 },
                    depth_func: DepthFunc::LessEqual,
                },
                Command::SetDepthFunc(DepthFunc::Less),
            ]
        );
    }

    #[test]
    fn uniform_lookup_respects_program() {
        let mut backend = RecordingBackend::new();
        backend.use_program(Program::Gouraud);
        backend.set_float("material.shininess", 32.0);
        backend.use_program(Program::Sky);
        assert_eq!(
            backend.uniform(Program::Gouraud, "material.shininess"),
            Some(UniformValue::Float(32.0))
        );
        assert_eq!(backend.uniform(Program::Sky, "material.shininess"), None);
    }
}
