use hypertext::prelude::*;

/// A row of buttons, each of which submits an empty form carrying a single
/// action flag to `target`.
pub struct ActionButtons<'r> {
    pub target: &'r str,
    /// `(flag, label, enabled)`
    pub options: &'r [(&'r str, &'r str, bool)],
}

impl<'r> Renderable for ActionButtons<'r> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            div class = "row mt-3 mb-3" {
                @for (flag, text, enabled) in self.options {
                    div class = "col-md-auto" {
                        form method="post" action=(self.target) {
                            @if *enabled {
                                button class="btn btn-primary" type="submit"
                                    name=(flag) value="1" {
                                    (text)
                                }
                            } @else {
                                button class="btn btn-outline-secondary"
                                    type="submit" name=(flag) value="1"
                                    disabled {
                                    (text)
                                }
                            }
                        }
                    }
                }
            }
        }
        .render_to(buffer);
    }
}
