//! Layered layout for directed graphs
//!
//! 1. Back edges found by a depth-first walk are ignored, leaving a DAG.
//! 2. Longest-path ranking: sources sit on rank 0, every other node one rank
//!    below its deepest predecessor.
//! 3. Nodes keep insertion order within a rank, then one downward sweep
//!    sorts each rank by the mean position of its predecessors.
//! 4. Ranks are stacked `ranksep` apart, nodes `nodesep` apart, and every
//!    rank is centred against the widest one.
//!
//! Coordinates are computed top-to-bottom and then rotated for `rankdir`.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RankDir {
    #[default]
    TopBottom,
    BottomTop,
    LeftRight,
    RightLeft,
}

impl RankDir {
    /// `TB`, `BT`, `LR`, `RL` (any case); anything else is top-to-bottom
    pub fn parse(text: &str) -> Self {
        match text.to_ascii_uppercase().as_str() {
            "BT" => RankDir::BottomTop,
            "LR" => RankDir::LeftRight,
            "RL" => RankDir::RightLeft,
            _ => RankDir::TopBottom,
        }
    }

    fn is_horizontal(self) -> bool {
        matches!(self, RankDir::LeftRight | RankDir::RightLeft)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    pub rankdir: RankDir,
    pub nodesep: f64,
    pub ranksep: f64,
    pub marginx: f64,
    pub marginy: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            rankdir: RankDir::TopBottom,
            nodesep: 50.0,
            ranksep: 50.0,
            marginx: 0.0,
            marginy: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layout {
    /// Node centres, indexed like the input nodes
    pub positions: Vec<Point>,
    pub ranks: Vec<usize>,
    pub width: f64,
    pub height: f64,
}

/// Lay out `nodes` connected by `edges` (pairs of node indices)
pub fn layout(nodes: &[Size], edges: &[(usize, usize)], options: &LayoutOptions) -> Layout {
    let count = nodes.len();
    if count == 0 {
        return Layout {
            width: 2.0 * options.marginx,
            height: 2.0 * options.marginy,
            ..Layout::default()
        };
    }
    let forward = acyclic_edges(count, edges);
    let ranks = rank(count, &forward);
    let layers = order(&ranks, &forward);

    // `along` runs inside a rank, `across` from rank to rank
    let horizontal = options.rankdir.is_horizontal();
    let along = |size: &Size| if horizontal { size.height } else { size.width };
    let across = |size: &Size| if horizontal { size.width } else { size.height };

    let layer_widths: Vec<f64> = layers
        .iter()
        .map(|layer| {
            let sizes: f64 = layer.iter().map(|&node| along(&nodes[node])).sum();
            sizes + options.nodesep * layer.len().saturating_sub(1) as f64
        })
        .collect();
    let widest = layer_widths.iter().cloned().fold(0.0, f64::max);

    let mut local = vec![Point::default(); count];
    let mut offset = 0.0;
    for (index, layer) in layers.iter().enumerate() {
        let thickness = layer.iter().map(|&node| across(&nodes[node])).fold(0.0, f64::max);
        let mut cursor = (widest - layer_widths[index]) / 2.0;
        for &node in layer {
            let size = along(&nodes[node]);
            local[node] = Point {
                x: cursor + size / 2.0,
                y: offset + thickness / 2.0,
            };
            cursor += size + options.nodesep;
        }
        offset += thickness;
        if index + 1 < layers.len() {
            offset += options.ranksep;
        }
    }
    let depth = offset;

    let positions = local
        .iter()
        .map(|point| {
            let (x, y) = match options.rankdir {
                RankDir::TopBottom => (point.x, point.y),
                RankDir::BottomTop => (point.x, depth - point.y),
                RankDir::LeftRight => (point.y, point.x),
                RankDir::RightLeft => (depth - point.y, point.x),
            };
            Point {
                x: x + options.marginx,
                y: y + options.marginy,
            }
        })
        .collect();
    let (width, height) = if horizontal { (depth, widest) } else { (widest, depth) };

    Layout {
        positions,
        ranks,
        width: width + 2.0 * options.marginx,
        height: height + 2.0 * options.marginy,
    }
}

/// Edges minus self loops and the back edges of a depth-first walk in node order
pub fn acyclic_edges(count: usize, edges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut successors = vec![Vec::new(); count];
    for (index, &(from, to)) in edges.iter().enumerate() {
        if from < count && to < count && from != to {
            successors[from].push((to, index));
        }
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Active,
        Done,
    }
    let mut marks = vec![Mark::New; count];
    let mut back = vec![false; edges.len()];
    for root in 0..count {
        if marks[root] != Mark::New {
            continue;
        }
        // (node, next successor to visit)
        let mut stack = vec![(root, 0usize)];
        marks[root] = Mark::Active;
        while let Some(top) = stack.last_mut() {
            let node = top.0;
            let Some(&(to, edge)) = successors[node].get(top.1) else {
                marks[node] = Mark::Done;
                stack.pop();
                continue;
            };
            top.1 += 1;
            match marks[to] {
                Mark::Active => back[edge] = true,
                Mark::New => {
                    marks[to] = Mark::Active;
                    stack.push((to, 0));
                }
                Mark::Done => {}
            }
        }
    }

    edges
        .iter()
        .enumerate()
        .filter(|&(index, &(from, to))| from < count && to < count && from != to && !back[index])
        .map(|(_, &edge)| edge)
        .collect()
}

/// Longest-path rank of every node over acyclic `edges`
pub fn rank(count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut successors = vec![Vec::new(); count];
    let mut indegree = vec![0usize; count];
    for &(from, to) in edges {
        successors[from].push(to);
        indegree[to] += 1;
    }
    let mut ranks = vec![0usize; count];
    let mut queue: VecDeque<usize> = (0..count).filter(|&node| indegree[node] == 0).collect();
    while let Some(node) = queue.pop_front() {
        for &next in &successors[node] {
            ranks[next] = ranks[next].max(ranks[node] + 1);
            indegree[next] -= 1;
            if indegree[next] == 0 {
                queue.push_back(next);
            }
        }
    }
    ranks
}

/// Nodes of each rank, ordered by the mean position of their predecessors
pub fn order(ranks: &[usize], edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let layer_count = ranks.iter().max().map_or(0, |max| max + 1);
    let mut layers = vec![Vec::new(); layer_count];
    for (node, &rank) in ranks.iter().enumerate() {
        layers[rank].push(node);
    }

    let mut predecessors = vec![Vec::new(); ranks.len()];
    for &(from, to) in edges {
        predecessors[to].push(from);
    }
    let mut position = vec![0usize; ranks.len()];
    for layer in &layers {
        for (index, &node) in layer.iter().enumerate() {
            position[node] = index;
        }
    }

    for rank in 1..layers.len() {
        let mut keyed: Vec<(f64, usize)> = layers[rank]
            .iter()
            .enumerate()
            .map(|(index, &node)| {
                // Only predecessors on the rank directly above carry a position to follow
                let above: Vec<usize> = predecessors[node]
                    .iter()
                    .filter(|&&from| ranks[from] + 1 == rank)
                    .map(|&from| position[from])
                    .collect();
                let key = if above.is_empty() {
                    index as f64
                } else {
                    above.iter().sum::<usize>() as f64 / above.len() as f64
                };
                (key, node)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        layers[rank] = keyed.into_iter().map(|(_, node)| node).collect();
        for (index, &node) in layers[rank].iter().enumerate() {
            position[node] = index;
        }
    }
    layers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(count: usize) -> Vec<Size> {
        vec![
            Size {
                width: 10.0,
                height: 10.0,
            };
            count
        ]
    }

    fn centres(layout: &Layout) -> Vec<(f64, f64)> {
        layout.positions.iter().map(|p| (p.x, p.y)).collect()
    }

    #[test]
    fn test_chain_top_bottom() {
        let result = layout(&square(3), &[(0, 1), (1, 2)], &LayoutOptions::default());
        assert_eq!(result.ranks, vec![0, 1, 2]);
        assert_eq!(centres(&result), vec![(5.0, 5.0), (5.0, 65.0), (5.0, 125.0)]);
        assert_eq!((result.width, result.height), (10.0, 130.0));
    }

    #[test]
    fn test_diamond_is_centred() {
        let result = layout(&square(4), &[(0, 1), (0, 2), (1, 3), (2, 3)], &LayoutOptions::default());
        assert_eq!(result.ranks, vec![0, 1, 1, 2]);
        assert_eq!(
            centres(&result),
            vec![(35.0, 5.0), (5.0, 65.0), (65.0, 65.0), (35.0, 125.0)]
        );
        assert_eq!(result.width, 70.0);
    }

    #[test]
    fn test_longest_path_wins() {
        // a -> c directly and through b
        let ranks = rank(3, &[(0, 2), (0, 1), (1, 2)]);
        assert_eq!(ranks, vec![0, 1, 2]);
    }

    #[test]
    fn test_cycles_and_self_loops_are_broken() {
        let edges = acyclic_edges(3, &[(0, 1), (1, 2), (2, 0), (1, 1)]);
        assert_eq!(edges, vec![(0, 1), (1, 2)]);
        assert_eq!(rank(3, &edges), vec![0, 1, 2]);
    }

    #[test]
    fn test_rankdir_rotates() {
        let edges = [(0, 1)];
        let options = |rankdir| LayoutOptions {
            rankdir,
            ..LayoutOptions::default()
        };
        let lr = layout(&square(2), &edges, &options(RankDir::LeftRight));
        assert_eq!(centres(&lr), vec![(5.0, 5.0), (65.0, 5.0)]);
        assert_eq!((lr.width, lr.height), (70.0, 10.0));

        let bt = layout(&square(2), &edges, &options(RankDir::BottomTop));
        assert_eq!(centres(&bt), vec![(5.0, 65.0), (5.0, 5.0)]);

        let rl = layout(&square(2), &edges, &options(RankDir::RightLeft));
        assert_eq!(centres(&rl), vec![(65.0, 5.0), (5.0, 5.0)]);
        assert_eq!(RankDir::parse("lr"), RankDir::LeftRight);
        assert_eq!(RankDir::parse("diagonal"), RankDir::TopBottom);
    }

    #[test]
    fn test_separation_and_margins() {
        let options = LayoutOptions {
            nodesep: 20.0,
            ranksep: 100.0,
            marginx: 7.0,
            marginy: 3.0,
            ..LayoutOptions::default()
        };
        let result = layout(&square(3), &[(0, 1), (0, 2)], &options);
        assert_eq!(
            centres(&result),
            vec![(27.0, 8.0), (12.0, 118.0), (42.0, 118.0)]
        );
        assert_eq!((result.width, result.height), (54.0, 126.0));
    }

    #[test]
    fn test_predecessor_order_reduces_crossings() {
        // a, b on rank 0; c hangs off b, d off a: d should come first
        let layers = order(&[0, 0, 1, 1], &[(1, 2), (0, 3)]);
        assert_eq!(layers, vec![vec![0, 1], vec![3, 2]]);
    }

    #[test]
    fn test_empty_graph() {
        let result = layout(&[], &[], &LayoutOptions::default());
        assert!(result.positions.is_empty());
        assert_eq!((result.width, result.height), (0.0, 0.0));
    }
}
