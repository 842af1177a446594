//! Standalone HTML page showing an arrangement as SVG, for debugging.

use crate::arrangement::Arrangement;
use crate::math::Point2;

/// Rendering switches for [`debug_html`].
#[derive(Debug, Clone, Copy)]
pub struct HtmlOptions {
    /// Width of the SVG element in pixels.
    pub width: u32,
    /// Draw half-edge direction arrows on every edge.
    pub arrows: bool,
    /// Draw a dot on every vertex.
    pub dots: bool,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            width: 800,
            arrows: false,
            dots: true,
        }
    }
}

const PLAIN_COLOR: &str = "#333333";
const DOORSTEP_COLOR: &str = "#d62728";

/// Renders the arrangement as an HTML page with vertex, edge and face
/// counts and an inline SVG. Doorstep edges are drawn in their own group.
#[must_use]
pub fn debug_html(arrangement: &Arrangement, options: &HtmlOptions) -> String {
    let segments = arrangement.segments();
    let (min, max) = bounds(&segments);
    let extent = (max.x - min.x).max(max.y - min.y).max(1e-9);
    let margin = extent * 0.05;
    let stroke = extent / 400.0;
    let faces = arrangement
        .face_count()
        .map_or_else(|_| "outdated".to_string(), |n| n.to_string());

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>arrangement</title></head>\n<body>\n");
    html.push_str(&format!(
        "<p>vertices: {} &middot; edges: {} &middot; faces: {} &middot; doorsteps: {}</p>\n",
        arrangement.vertex_count(),
        arrangement.edge_count(),
        faces,
        arrangement.doorstep_count()
    ));
    // The y axis is flipped so the drawing matches plan coordinates.
    html.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" viewBox=\"{} {} {} {}\">\n",
        options.width,
        min.x - margin,
        -max.y - margin,
        max.x - min.x + 2.0 * margin,
        max.y - min.y + 2.0 * margin
    ));
    if options.arrows {
        html.push_str(
            "<defs><marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" \
             markerWidth=\"6\" markerHeight=\"6\" orient=\"auto\">\
             <path d=\"M0,0 L10,5 L0,10 z\"/></marker></defs>\n",
        );
    }
    html.push_str("<g transform=\"scale(1,-1)\">\n");

    for (doorstep, color) in [(false, PLAIN_COLOR), (true, DOORSTEP_COLOR)] {
        html.push_str(&format!(
            "<g class=\"{}\" stroke=\"{color}\" stroke-width=\"{stroke}\" fill=\"none\">\n",
            if doorstep { "doorstep" } else { "plain" }
        ));
        for (a, b, _) in segments.iter().filter(|s| s.2 == doorstep) {
            let marker = if options.arrows {
                " marker-end=\"url(#arrow)\""
            } else {
                ""
            };
            html.push_str(&format!(
                "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\"{marker}/>\n",
                a.x, a.y, b.x, b.y
            ));
        }
        html.push_str("</g>\n");
    }

    if options.dots {
        html.push_str(&format!("<g fill=\"{PLAIN_COLOR}\">\n"));
        for id in arrangement.vertex_ids() {
            if let Ok(p) = arrangement.point(id) {
                let p = p.to_point();
                html.push_str(&format!(
                    "  <circle cx=\"{}\" cy=\"{}\" r=\"{}\"/>\n",
                    p.x,
                    p.y,
                    stroke * 2.0
                ));
            }
        }
        html.push_str("</g>\n");
    }

    html.push_str("</g>\n</svg>\n</body>\n</html>\n");
    html
}

fn bounds(segments: &[(Point2, Point2, bool)]) -> (Point2, Point2) {
    let mut points = segments.iter().flat_map(|(a, b, _)| [a, b]);
    let Some(first) = points.next() else {
        return (Point2::origin(), Point2::new(1.0, 1.0));
    };
    points.fold((*first, *first), |(lo, hi), p| {
        (
            Point2::new(lo.x.min(p.x), lo.y.min(p.y)),
            Point2::new(hi.x.max(p.x), hi.y.max(p.y)),
        )
    })
}
