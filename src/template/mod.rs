//! Templating code.
//!
//! This defines the [`Page`] item, which every page of the site is rendered
//! through.

use hypertext::prelude::*;

use crate::{flash::Flash, widgets::alert::FlashAlert};

pub struct Page<R1: Renderable> {
    title: Option<String>,
    body: Option<R1>,
    flash: Option<Flash>,
}

impl<R1: Renderable> Page<R1> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn body(mut self, body: R1) -> Self {
        self.body = Some(body);
        self
    }

    /// Shows the banner left behind by the previous form submission.
    pub fn flash(mut self, flash: Option<Flash>) -> Self {
        self.flash = flash;
        self
    }
}

impl<R1: Renderable> Renderable for Page<R1> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            html lang="en" {
                head {
                    title {
                        @if let Some(title) = &self.title {
                            (title) " · "
                        }
                        "Torneo"
                    }
                    link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css" rel="stylesheet" integrity="sha384-QWTKZyjpPEjISv5WaRU9OFeRpok6YctnYmDr5pNlyT2bRjXh0JMhjY6hW+ALEwIH" crossorigin="anonymous";
                    meta
                        name="viewport"
                        content="width=device-width, initial-scale=1";
                }
                body class="d-flex flex-column vh-100" {
                    nav class="navbar navbar-expand"
                        style="background-color: #1d4e89;"
                        data-bs-theme="dark" {
                        div class="container-fluid" {
                            a class="navbar-brand text-white" href="/" {
                                "Torneo"
                            }
                            ul class="navbar-nav" style="display: flex; gap: 1rem;" {
                                li class="nav-item" {
                                    a class="nav-link text-white" href="/draw" {
                                        "Teams & draw"
                                    }
                                }
                                li class="nav-item" {
                                    a class="nav-link text-white" href="/results" {
                                        "Results"
                                    }
                                }
                            }
                        }
                    }
                    div class="container flex-grow-1 py-3" {
                        @if let Some(flash) = &self.flash {
                            FlashAlert flash=(flash);
                        }
                        @if let Some(body) = &self.body {
                            (body)
                        }
                    }
                }
            }
        }
        .render_to(buffer)
    }
}

impl<R1: Renderable> Default for Page<R1> {
    fn default() -> Self {
        Self {
            title: Default::default(),
            body: Default::default(),
            flash: Default::default(),
        }
    }
}
