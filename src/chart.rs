use crate::errors::AppError;
use crate::models::Summary;
use image::{codecs::png::PngEncoder, ColorType, ImageEncoder};
use plotters::prelude::*;

/// Metrics drawn as bars, left to right.
pub const CHART_METRICS: [&str; 4] = [
    "missing_names",
    "missing_emails",
    "missing_phones",
    "duplicates",
];

const BAR_COLOR: RGBColor = RGBColor(135, 206, 235);

/// Bar heights in `CHART_METRICS` order.
pub fn chart_values(summary: &Summary) -> [u32; 4] {
    [
        summary.missing_names,
        summary.missing_emails,
        summary.missing_phones,
        summary.duplicates,
    ]
    .map(|count| u32::try_from(count).unwrap_or(u32::MAX))
}

fn chart_err<E: std::fmt::Display>(err: E) -> AppError {
    AppError::ChartError(err.to_string())
}

/// Renders the summary bar chart and returns it as PNG bytes.
///
/// Each call draws on its own in-memory RGB surface; bars only, no text.
pub fn render_summary_chart(summary: &Summary, width: u32, height: u32) -> Result<Vec<u8>, AppError> {
    if width == 0 || height == 0 {
        return Err(AppError::ChartError(format!(
            "invalid chart size {}x{}",
            width, height
        )));
    }

    let values = chart_values(summary);
    let peak = values.iter().copied().max().unwrap_or(0).max(1);
    let y_max = peak.saturating_add(peak / 10 + 1);

    let mut pixels = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .build_cartesian_2d((0u32..values.len() as u32).into_segmented(), 0u32..y_max)
            .map_err(chart_err)?;

        // No font backend is compiled in, so no mesh labels or captions.
        chart
            .draw_series(
                Histogram::vertical(&chart)
                    .style(BAR_COLOR.filled())
                    .margin(12)
                    .data(values.iter().enumerate().map(|(i, v)| (i as u32, *v))),
            )
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
    }

    encode_png(&pixels, width, height)
}

fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, AppError> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(pixels, width, height, ColorType::Rgb8)
        .map_err(chart_err)?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmailCategoryBreakdown;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn sample_summary() -> Summary {
        Summary {
            total_contacts: 10,
            missing_names: 2,
            missing_emails: 5,
            missing_phones: 1,
            duplicates: 0,
            top_companies: vec![],
            severely_incomplete_count: 1,
            email_category_breakdown: EmailCategoryBreakdown::default(),
            avg_missing_fields: 0.8,
        }
    }

    #[test]
    fn test_chart_values_order() {
        assert_eq!(chart_values(&sample_summary()), [2, 5, 1, 0]);
    }

    #[test]
    fn test_render_produces_png() {
        let png = render_summary_chart(&sample_summary(), 600, 400).unwrap();
        assert!(png.len() > PNG_SIGNATURE.len());
        assert_eq!(&png[..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_render_all_zero_summary() {
        let mut summary = sample_summary();
        summary.missing_names = 0;
        summary.missing_emails = 0;
        summary.missing_phones = 0;
        let png = render_summary_chart(&summary, 200, 150).unwrap();
        assert_eq!(&png[..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_render_rejects_zero_size() {
        assert!(matches!(
            render_summary_chart(&sample_summary(), 0, 400),
            Err(AppError::ChartError(_))
        ));
    }
}
