//! Fixed-scale grayscale template matching

use super::{MatchResult, MatchingMethod, TemplateConfig};
use crate::error::CvError;
use crate::traits::TemplateMatchable;
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::definitions::Image;
use imageproc::integral_image::{integral_image, integral_squared_image};
use imageproc::template_matching::{MatchTemplateMethod, find_extremes};

#[cfg(feature = "parallel")]
use imageproc::template_matching::match_template_parallel as correlate;
#[cfg(not(feature = "parallel"))]
use imageproc::template_matching::match_template as correlate;

/// Sum of squared deviations below which a window is treated as flat
const MIN_VARIANCE: f64 = 0.5;

/// Correlation-based template matcher
#[derive(Debug, Clone, Default)]
pub struct TemplateMatcher {
    config: TemplateConfig,
}

impl TemplateMatcher {
    /// Create new template matcher
    pub fn new(config: TemplateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// Match a template using the configured threshold
    pub fn match_default(
        &self,
        frame: &GrayImage,
        template: &GrayImage,
    ) -> Result<MatchResult, CvError> {
        self.match_template(frame, template, self.config.threshold)
    }

    /// Best confidence and its location over the whole frame
    pub fn best_match(
        &self,
        frame: &GrayImage,
        template: &GrayImage,
    ) -> Result<(f64, (u32, u32)), CvError> {
        check_fits(frame, template)?;

        let (score, location) = match self.config.matching_method {
            MatchingMethod::CCoeffNormed => {
                let extremes = find_extremes(&correlation_coefficient(frame, template));
                (f64::from(extremes.max_value), extremes.max_value_location)
            }
            MatchingMethod::CCorrNormed => {
                let surface = correlate(frame, template, MatchTemplateMethod::CrossCorrelationNormalized);
                let extremes = find_extremes(&surface);
                (f64::from(extremes.max_value), extremes.max_value_location)
            }
            MatchingMethod::SqDiffNormed => {
                let surface = correlate(frame, template, MatchTemplateMethod::SumOfSquaredErrorsNormalized);
                let extremes = find_extremes(&surface);
                // Convert to "higher is better"
                (1.0 - f64::from(extremes.min_value), extremes.min_value_location)
            }
        };

        // Degenerate windows can divide by zero; count them as no similarity
        let confidence = if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Ok((confidence, location))
    }
}

impl TemplateMatchable for TemplateMatcher {
    fn match_template(
        &self,
        frame: &GrayImage,
        template: &GrayImage,
        threshold: f64,
    ) -> Result<MatchResult, CvError> {
        let (confidence, location) = self.best_match(frame, template)?;
        Ok(MatchResult {
            matched: confidence > threshold,
            confidence,
            location,
        })
    }
}

fn check_fits(frame: &GrayImage, template: &GrayImage) -> Result<(), CvError> {
    let (template_width, template_height) = template.dimensions();
    let (frame_width, frame_height) = frame.dimensions();

    if template_width == 0 || template_height == 0 {
        return Err(CvError::EmptyTemplate);
    }
    if template_width > frame_width || template_height > frame_height {
        return Err(CvError::InvalidTemplateSize {
            template_width,
            template_height,
            frame_width,
            frame_height,
        });
    }
    Ok(())
}

/// Mean-subtracted normalized cross-correlation surface.
///
/// The numerator correlates the frame with the mean-centred template in f64;
/// window variances come from integral images. Subtracting the means after an
/// f32 raw correlation cancels badly on bright low-contrast icons.
fn correlation_coefficient(frame: &GrayImage, template: &GrayImage) -> Image<Luma<f32>> {
    let (width, height) = template.dimensions();
    let out_width = frame.width() - width + 1;
    let out_height = frame.height() - height + 1;
    let n = f64::from(width) * f64::from(height);

    let (t_sum, t_sq_sum) = template.pixels().fold((0.0, 0.0), |(sum, sq), p| {
        let v = f64::from(p[0]);
        (sum + v, sq + v * v)
    });
    let t_var = t_sq_sum - t_sum * t_sum / n;
    if t_var < MIN_VARIANCE {
        // A flat template correlates with nothing
        return ImageBuffer::new(out_width, out_height);
    }
    let t_mean = t_sum / n;
    let centred: Vec<f64> = template.pixels().map(|p| f64::from(p[0]) - t_mean).collect();

    let sums = integral_image::<_, u64>(frame);
    let squares = integral_squared_image::<_, u64>(frame);

    let score_row = |y: u32| -> Vec<f32> {
        (0..out_width)
            .map(|x| {
                let sum = window_sum(&sums, x, y, width, height) as f64;
                let sq_sum = window_sum(&squares, x, y, width, height) as f64;
                let f_var = sq_sum - sum * sum / n;
                if f_var < MIN_VARIANCE {
                    return 0.0;
                }
                let numerator = centred_correlation(frame, &centred, x, y, width, height);
                (numerator / (f_var * t_var).sqrt()) as f32
            })
            .collect()
    };

    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<f32>> = {
        use rayon::prelude::*;
        (0..out_height).into_par_iter().map(score_row).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<f32>> = (0..out_height).map(score_row).collect();

    ImageBuffer::from_fn(out_width, out_height, |x, y| {
        Luma([rows[y as usize][x as usize]])
    })
}

/// Σ F·(T − t̄) over the window whose top-left corner is (x, y)
fn centred_correlation(
    frame: &GrayImage,
    centred: &[f64],
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> f64 {
    let stride = frame.width() as usize;
    let raw = frame.as_raw();
    let width = width as usize;

    (0..height as usize)
        .map(|row| {
            let start = (y as usize + row) * stride + x as usize;
            raw[start..start + width]
                .iter()
                .zip(&centred[row * width..(row + 1) * width])
                .map(|(&f, &t)| f64::from(f) * t)
                .sum::<f64>()
        })
        .sum()
}

/// Sum over the `width` x `height` window whose top-left corner is (x, y)
fn window_sum(integral: &Image<Luma<u64>>, x: u32, y: u32, width: u32, height: u32) -> u64 {
    let at = |px: u32, py: u32| integral.get_pixel(px, py)[0];
    at(x + width, y + height) + at(x, y) - at(x + width, y) - at(x, y + height)
}
