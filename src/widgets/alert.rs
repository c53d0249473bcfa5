use hypertext::prelude::*;

use crate::flash::{Flash, FlashKind};

pub struct ErrorAlert<S> {
    pub msg: S,
}

impl<S: ToString> Renderable for ErrorAlert<S> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud!({
            div class="alert alert-danger" role="alert" {
                (self.msg.to_string())
            }
        })
        .render_to(buffer);
    }
}

pub struct SuccessAlert<S> {
    pub msg: S,
}

impl<S: ToString> Renderable for SuccessAlert<S> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud!({
            div class="alert alert-success" role="alert" {
                (self.msg.to_string())
            }
        })
        .render_to(buffer);
    }
}

pub struct FlashAlert<'r> {
    pub flash: &'r Flash,
}

impl Renderable for FlashAlert<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        match self.flash.kind {
            FlashKind::Success => SuccessAlert {
                msg: &self.flash.text,
            }
            .render_to(buffer),
            FlashKind::Error => ErrorAlert {
                msg: &self.flash.text,
            }
            .render_to(buffer),
        }
    }
}
