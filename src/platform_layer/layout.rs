/*
 * Computes control rectangles from `LayoutRule`s. This is plain arithmetic
 * over the rules and a client size, so the `WM_SIZE` handler only has to move
 * native windows to the rectangles returned here.
 *
 * Rules are grouped by parent. Within a parent, docked rules (Top, Bottom,
 * Left, Right) are applied in ascending `order` and each one carves its
 * `fixed_size` off the remaining area. Fill and ProportionalFill rules are
 * then placed in what is left; proportional siblings split the remaining width
 * by weight. Margins shrink the final rectangle of a control without changing
 * how much space it consumed. Children are positioned relative to their
 * parent control.
 */

use super::types::{ControlId, DockStyle, LayoutRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct LayoutRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl LayoutRect {
    pub(crate) fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        LayoutRect {
            x,
            y,
            width: width.max(0),
            height: height.max(0),
        }
    }

    // Margin order is (top, right, bottom, left).
    fn shrink(self, margin: (i32, i32, i32, i32)) -> Self {
        let (top, right, bottom, left) = margin;
        LayoutRect::new(
            self.x + left,
            self.y + top,
            self.width - left - right,
            self.height - top - bottom,
        )
    }
}

/*
 * Lays out every rule reachable from the window client area. The result is
 * ordered parents-first, which is also the order native windows should be
 * moved in.
 */
pub(crate) fn calculate_layout(
    rules: &[LayoutRule],
    client_width: i32,
    client_height: i32,
) -> Vec<(ControlId, LayoutRect)> {
    let mut placements = Vec::with_capacity(rules.len());
    place_children(
        rules,
        None,
        LayoutRect::new(0, 0, client_width, client_height),
        &mut placements,
    );
    placements
}

fn place_children(
    rules: &[LayoutRule],
    parent: Option<ControlId>,
    area: LayoutRect,
    placements: &mut Vec<(ControlId, LayoutRect)>,
) {
    let mut siblings: Vec<&LayoutRule> = rules
        .iter()
        .filter(|rule| rule.parent_control_id == parent)
        .collect();
    if siblings.is_empty() {
        return;
    }
    siblings.sort_by_key(|rule| rule.order);

    let mut remaining = area;
    let mut placed: Vec<(ControlId, LayoutRect)> = Vec::with_capacity(siblings.len());
    let mut fills: Vec<&LayoutRule> = Vec::new();

    for rule in &siblings {
        let size = rule.fixed_size.unwrap_or(0).max(0);
        let outer = match rule.dock_style {
            DockStyle::Top => {
                let height = size.min(remaining.height);
                let rect = LayoutRect::new(remaining.x, remaining.y, remaining.width, height);
                remaining = LayoutRect::new(
                    remaining.x,
                    remaining.y + height,
                    remaining.width,
                    remaining.height - height,
                );
                rect
            }
            DockStyle::Bottom => {
                let height = size.min(remaining.height);
                let rect = LayoutRect::new(
                    remaining.x,
                    remaining.y + remaining.height - height,
                    remaining.width,
                    height,
                );
                remaining = LayoutRect::new(
                    remaining.x,
                    remaining.y,
                    remaining.width,
                    remaining.height - height,
                );
                rect
            }
            DockStyle::Left => {
                let width = size.min(remaining.width);
                let rect = LayoutRect::new(remaining.x, remaining.y, width, remaining.height);
                remaining = LayoutRect::new(
                    remaining.x + width,
                    remaining.y,
                    remaining.width - width,
                    remaining.height,
                );
                rect
            }
            DockStyle::Right => {
                let width = size.min(remaining.width);
                let rect = LayoutRect::new(
                    remaining.x + remaining.width - width,
                    remaining.y,
                    width,
                    remaining.height,
                );
                remaining = LayoutRect::new(
                    remaining.x,
                    remaining.y,
                    remaining.width - width,
                    remaining.height,
                );
                rect
            }
            DockStyle::Fill | DockStyle::ProportionalFill { .. } => {
                fills.push(rule);
                continue;
            }
        };
        placed.push((rule.control_id, outer.shrink(rule.margin)));
    }

    let total_weight: f32 = fills
        .iter()
        .filter_map(|rule| match rule.dock_style {
            DockStyle::ProportionalFill { weight } => Some(weight.max(0.0)),
            _ => None,
        })
        .sum();
    let mut next_x = remaining.x;
    let mut consumed_weight = 0.0f32;
    for rule in fills {
        let outer = match rule.dock_style {
            DockStyle::ProportionalFill { weight } if total_weight > 0.0 => {
                consumed_weight += weight.max(0.0);
                // Rounding against the cumulative weight keeps the last
                // sibling flush with the right edge.
                let end_x = remaining.x
                    + (remaining.width as f32 * consumed_weight / total_weight).round() as i32;
                let rect = LayoutRect::new(next_x, remaining.y, end_x - next_x, remaining.height);
                next_x = end_x;
                rect
            }
            _ => remaining,
        };
        placed.push((rule.control_id, outer.shrink(rule.margin)));
    }

    for (control_id, rect) in placed {
        placements.push((control_id, rect));
        place_children(
            rules,
            Some(control_id),
            LayoutRect::new(0, 0, rect.width, rect.height),
            placements,
        );
    }
}
