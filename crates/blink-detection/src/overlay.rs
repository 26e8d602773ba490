//! Frame annotation: landmark dots, eye contours and face boxes

use camera_capture::VideoFrame;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::analysis::FrameAnalysis;
use crate::geometry::{BoundingBox, Point2};
use crate::landmarks::LandmarkSet;
use crate::DetectionError;

const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);

/// Draw the analysis of a frame onto it
///
/// Eye contours of a face whose eyes are closed are drawn in red, everything
/// else in green.
pub fn annotate(
    frame: &mut VideoFrame,
    faces: &[LandmarkSet],
    analysis: &FrameAnalysis,
) -> Result<(), DetectionError> {
    let mut img = frame.to_rgb_image()?;

    for face in faces {
        for p in face.points() {
            draw_filled_circle_mut(&mut img, (p.x.round() as i32, p.y.round() as i32), 1, GREEN);
        }
    }

    for face in &analysis.faces {
        let eye_color = if face.eye_closed { RED } else { GREEN };
        draw_closed_polyline(&mut img, &face.left_eye, eye_color);
        draw_closed_polyline(&mut img, &face.right_eye, eye_color);

        if let Some(bbox) = face.face_bbox {
            draw_box(&mut img, &bbox, GREEN);
            let outer = BoundingBox {
                x: bbox.x - 1.0,
                y: bbox.y - 1.0,
                width: bbox.width + 2.0,
                height: bbox.height + 2.0,
            };
            draw_box(&mut img, &outer, GREEN);
        }
    }

    frame.data = img.into_raw();
    Ok(())
}

fn draw_closed_polyline(img: &mut RgbImage, points: &[Point2], color: Rgb<u8>) {
    if points.len() < 2 {
        return;
    }
    for (i, start) in points.iter().enumerate() {
        let end = points[(i + 1) % points.len()];
        draw_line_segment_mut(
            img,
            (start.x as f32, start.y as f32),
            (end.x as f32, end.y as f32),
            color,
        );
    }
}

fn draw_box(img: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    let corners = [
        Point2::new(bbox.x, bbox.y),
        Point2::new(bbox.right(), bbox.y),
        Point2::new(bbox.right(), bbox.bottom()),
        Point2::new(bbox.x, bbox.bottom()),
    ];
    draw_closed_polyline(img, &corners, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlinkConfig, FrameAnalyzer};

    fn square_face() -> LandmarkSet {
        let mut points = vec![Point2::new(20.0, 20.0); 68];
        points[0] = Point2::new(5.0, 5.0);
        points[1] = Point2::new(40.0, 40.0);
        LandmarkSet::new(points)
    }

    #[test]
    fn test_annotate_draws_face_box() {
        let mut frame = VideoFrame::blank(48, 48, 0);
        let faces = vec![square_face()];
        let mut analyzer = FrameAnalyzer::new(BlinkConfig::default()).unwrap();
        let analysis = analyzer.process(&faces);

        annotate(&mut frame, &faces, &analysis).unwrap();

        // Top edge of the face box and a landmark dot
        assert_eq!(frame.get_pixel(20, 5), Some([0, 255, 0]));
        assert_eq!(frame.get_pixel(40, 40), Some([0, 255, 0]));
        // Outside everything
        assert_eq!(frame.get_pixel(46, 2), Some([0, 0, 0]));
    }

    #[test]
    fn test_annotate_rejects_bad_buffer() {
        let mut frame = VideoFrame::new(vec![0; 10], 8, 8, 0, 0);
        let result = annotate(&mut frame, &[], &FrameAnalysis::default());
        assert!(result.is_err());
    }
}
