use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::CanvasState;
use super::style::{ElementState, NodeStyle, Shape};
use super::types::Node;

const BACKGROUND: &str = "#1a1a2e";
const RUBBER_BAND: &str = "rgba(255, 209, 102, 0.9)";
const CORNER_RADIUS: f64 = 10.0;

pub fn render(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_rubber_band(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_edges(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	let graph = state.graph();
	let selected = state.selection().map(|n| n.id.as_str());

	for edge in graph.edges() {
		let (Some(a), Some(b)) = (graph.node(&edge.source), graph.node(&edge.target)) else {
			continue;
		};
		let lit = selected.is_some_and(|id| edge.touches(id));
		let style = state.stylesheet.edge_style(
			edge,
			ElementState {
				selected: lit,
				hovered: false,
			},
		);
		ctx.set_stroke_style_str(style.stroke);
		ctx.set_line_width(style.stroke_width / state.transform.k.max(0.5));
		ctx.begin_path();
		ctx.move_to(a.position.x, a.position.y);
		ctx.line_to(b.position.x, b.position.y);
		ctx.stroke();
	}
}

fn draw_rubber_band(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	let Some((start, end)) = state.rubber_band() else {
		return;
	};
	let k = state.transform.k;
	let (dash, gap) = (8.0 / k, 4.0 / k);
	ctx.set_stroke_style_str(RUBBER_BAND);
	ctx.set_line_width(2.0 / k);
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(dash),
		&JsValue::from_f64(gap),
	));
	ctx.begin_path();
	ctx.move_to(start.x, start.y);
	ctx.line_to(end.x, end.y);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	ctx.set_fill_style_str(RUBBER_BAND);
	ctx.begin_path();
	let _ = ctx.arc(end.x, end.y, 4.0 / k, 0.0, 2.0 * PI);
	ctx.fill();
}

fn draw_nodes(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	let selected = state.selection().map(|n| n.id.as_str());
	let hovered = state.hover.as_deref();

	for node in state.graph().nodes() {
		let element = ElementState {
			selected: selected == Some(node.id.as_str()),
			hovered: hovered == Some(node.id.as_str()),
		};
		let style = state.stylesheet.node_style(node, element);

		if element.selected {
			draw_glow(node, &style, ctx);
		}

		trace_shape(node, &style, ctx);
		ctx.set_fill_style_str(style.fill);
		ctx.fill();
		ctx.set_stroke_style_str(style.stroke);
		ctx.set_line_width(style.stroke_width);
		ctx.stroke();

		ctx.set_fill_style_str(style.text_color);
		ctx.set_font(&format!("{}px sans-serif", style.font_size));
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		let label = fit_label(&node.label, style.width - 12.0, style.font_size);
		let _ = ctx.fill_text(&label, node.position.x, node.position.y);
	}
}

fn draw_glow(node: &Node, style: &NodeStyle, ctx: &CanvasRenderingContext2d) {
	let (x, y) = (node.position.x, node.position.y);
	let radius = style.width.max(style.height) * 0.75;
	let Ok(gradient) = ctx.create_radial_gradient(x, y, style.height * 0.3, x, y, radius) else {
		return;
	};
	let _ = gradient.add_color_stop(0.0, "rgba(255, 209, 102, 0.35)");
	let _ = gradient.add_color_stop(1.0, "rgba(255, 209, 102, 0)");
	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill();
}

fn trace_shape(node: &Node, style: &NodeStyle, ctx: &CanvasRenderingContext2d) {
	let (x, y) = (node.position.x, node.position.y);
	let (hw, hh) = (style.width / 2.0, style.height / 2.0);
	ctx.begin_path();
	match style.shape {
		Shape::Ellipse => {
			let _ = ctx.ellipse(x, y, hw, hh, 0.0, 0.0, 2.0 * PI);
		}
		Shape::RoundRect => {
			let r = CORNER_RADIUS.min(hh);
			let (left, top, right, bottom) = (x - hw, y - hh, x + hw, y + hh);
			ctx.move_to(left + r, top);
			let _ = ctx.arc_to(right, top, right, bottom, r);
			let _ = ctx.arc_to(right, bottom, left, bottom, r);
			let _ = ctx.arc_to(left, bottom, left, top, r);
			let _ = ctx.arc_to(left, top, right, top, r);
			ctx.close_path();
		}
	}
}

/// Shorten `label` with an ellipsis so it roughly fits `width` pixels.
fn fit_label(label: &str, width: f64, font_size: f64) -> String {
	let max_chars = (width / (font_size * 0.55)).floor().max(1.0) as usize;
	if label.chars().count() <= max_chars {
		return label.to_string();
	}
	let mut short: String = label.chars().take(max_chars.saturating_sub(1)).collect();
	short.push('…');
	short
}

#[cfg(test)]
mod tests {
	use super::fit_label;

	#[test]
	fn short_labels_are_untouched() {
		assert_eq!(fit_label("Main Idea", 148.0, 16.0), "Main Idea");
	}

	#[test]
	fn long_labels_get_an_ellipsis() {
		let label = fit_label("A very long label that cannot possibly fit", 108.0, 13.0);
		assert!(label.ends_with('…'));
		assert_eq!(label.chars().count(), 15);
	}
}
