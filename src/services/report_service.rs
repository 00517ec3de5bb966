use crate::error::Result;
use crate::services::stats_service::PerformanceExportRow;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};

pub struct ReportService;

impl ReportService {
    /// Styled XLSX of the performance table for the admin dashboard.
    pub fn performance_xlsx(rows: &[PerformanceExportRow]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Performance")?;

        let header_bg = Color::RGB(0x0F172A);
        let header_text = Color::White;
        let alt_row = Color::RGB(0xF8FAFC);
        let border_color = Color::RGB(0xE2E8F0);

        let score_high = Color::RGB(0x10B981);
        let score_mid = Color::RGB(0xF59E0B);
        let score_low = Color::RGB(0xEF4444);

        let columns = [
            ("User", 32.0),
            ("Sub-topic", 28.0),
            ("Test type", 18.0),
            ("Score (%)", 12.0),
            ("Questions", 12.0),
            ("Correct", 12.0),
            ("Taken at", 22.0),
        ];

        for (i, (_, width)) in columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        let title_format = Format::new()
            .set_font_size(16)
            .set_bold()
            .set_font_color(header_text)
            .set_background_color(Color::RGB(0x1E293B))
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(0, 36)?;
        worksheet.merge_range(0, 0, 0, (columns.len() - 1) as u16, "Performance report", &title_format)?;

        let subtitle_format = Format::new()
            .set_font_size(10)
            .set_italic()
            .set_font_color(Color::RGB(0x94A3B8))
            .set_background_color(Color::RGB(0x1E293B))
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(1, 20)?;
        let now = chrono::Utc::now().format("%d.%m.%Y %H:%M UTC").to_string();
        let subtitle = format!("Exported: {}  •  Rows: {}", now, rows.len());
        worksheet.merge_range(1, 0, 1, (columns.len() - 1) as u16, &subtitle, &subtitle_format)?;

        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(header_text)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        let header_row = 2;
        worksheet.set_row_height(header_row, 26)?;
        for (i, (name, _)) in columns.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, *name, &header_format)?;
        }

        let data_start = 3u32;
        for (idx, row) in rows.iter().enumerate() {
            let r = data_start + idx as u32;
            let bg = if idx % 2 == 0 { alt_row } else { Color::White };
            let cell = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            let score_color = if row.score >= 70 {
                score_high
            } else if row.score >= 40 {
                score_mid
            } else {
                score_low
            };
            let score_cell = Format::new()
                .set_font_size(10)
                .set_bold()
                .set_font_color(score_color)
                .set_background_color(bg)
                .set_align(FormatAlign::Center)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);

            worksheet.write_string_with_format(r, 0, &row.email, &cell)?;
            worksheet.write_string_with_format(r, 1, &row.sub_topic_name, &cell)?;
            worksheet.write_string_with_format(r, 2, &row.test_type, &cell)?;
            worksheet.write_number_with_format(r, 3, row.score as f64, &score_cell)?;
            worksheet.write_number_with_format(r, 4, row.total_questions as f64, &cell)?;
            worksheet.write_number_with_format(r, 5, row.correct_answers as f64, &cell)?;
            worksheet.write_string_with_format(
                r,
                6,
                &row.taken_at.format("%Y-%m-%d %H:%M").to_string(),
                &cell,
            )?;
        }

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}
