use crate::model::{Alignment, Paragraph, Role};

pub const BASE_FONT: &str = "Times New Roman";
pub const BASE_FONT_SIZE: f32 = 12.0;
pub const DOUBLE_SPACING: f32 = 2.0;
/// Half an inch, in points.
pub const HALF_INCH: f32 = 36.0;

/// Times New Roman 12 pt on every modelled run, double line spacing.
pub fn apply_base(para: &mut Paragraph) {
    para.line_spacing = Some(DOUBLE_SPACING);
    for run in para.runs.iter_mut().filter(|r| r.raw.is_none()) {
        run.font_name = Some(BASE_FONT.to_string());
        run.font_size = Some(BASE_FONT_SIZE);
    }
}

pub fn set_bold(para: &mut Paragraph) {
    for run in para.runs.iter_mut().filter(|r| r.raw.is_none() && !r.page_break) {
        run.bold = true;
    }
}

/// Apply the formatting tokens for `role`, including the base font.
pub fn apply(para: &mut Paragraph, role: Role) {
    apply_base(para);
    match role {
        Role::TitlePageLine => {
            para.alignment = Some(Alignment::Center);
        }
        Role::ArticleTitle | Role::ReferenceTitle => {
            para.alignment = Some(Alignment::Center);
            para.first_line_indent = Some(0.0);
            para.left_indent = Some(0.0);
            set_bold(para);
        }
        Role::Heading => {
            para.alignment = Some(Alignment::Left);
            para.first_line_indent = Some(0.0);
            para.left_indent = Some(0.0);
            set_bold(para);
        }
        Role::BodyText => {
            para.alignment = Some(Alignment::Left);
            para.first_line_indent = Some(HALF_INCH);
            para.left_indent = Some(0.0);
        }
        Role::ReferenceEntry => {
            para.alignment = Some(Alignment::Left);
            para.first_line_indent = Some(-HALF_INCH);
            para.left_indent = Some(HALF_INCH);
        }
    }
}
