//! Built-in SVG render engine.
//!
//! Nodes are drawn where the flow places them (`x`/`y` are node centres),
//! sized from their label the way the editor sizes them, and connected with
//! cubic Bézier wires from output ports to input ports. Layout is computed
//! synchronously during render, so the backend reports a stable layout as
//! soon as the import returns.

use std::collections::HashMap;
use std::sync::Arc;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use flowdraw_common::error::{FlowdrawError, FlowdrawResult};
use flowdraw_flow_model::{Flow, Node, Workspace};

use crate::engine::{RenderBackend, RenderEngine};
use crate::registry::{NodeTypeRegistry, SUBFLOW_INSTANCE_COLOR};
use crate::snapshot::Snapshot;

const NODE_WIDTH: f64 = 100.0;
const NODE_HEIGHT: f64 = 30.0;
const GRID_SIZE: f64 = 20.0;
const PORT_SIZE: f64 = 10.0;
const PORT_SPACING: f64 = 13.0;
const OUTPUT_HEIGHT: f64 = 15.0;
const LABEL_CHAR_WIDTH: f64 = 7.0;
const LABEL_PADDING: f64 = 50.0;
const CANVAS_MARGIN: f64 = 20.0;
const LINE_CURVE_SCALE: f64 = 0.75;
const MIN_CURVE_OFFSET: f64 = 40.0;
const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

const STYLE: &str = "\
.node rect.body{stroke:#999;stroke-width:1px}\
.node.unknown rect.body{stroke:#f00;stroke-dasharray:5,5}\
.node text{font-family:Helvetica,Arial,sans-serif;font-size:14px;fill:#333}\
.port{fill:#d9d9d9;stroke:#999}\
.wire{stroke:#999;stroke-width:3px;fill:none}\
.group{stroke-width:2px}\
.group text{font-family:Helvetica,Arial,sans-serif;font-size:14px;fill:#333}";

/// The built-in engine: renders workspaces as standalone SVG documents.
#[derive(Debug, Clone, Default)]
pub struct SvgEngine;

impl SvgEngine {
    pub fn new() -> Self {
        Self
    }
}

impl RenderEngine for SvgEngine {
    fn name(&self) -> &str {
        "svg"
    }

    fn open_backend(
        &self,
        registry: Arc<NodeTypeRegistry>,
    ) -> FlowdrawResult<Box<dyn RenderBackend>> {
        Ok(Box::new(SvgBackend::new(registry)))
    }
}

/// Drawing state for one session.
pub struct SvgBackend {
    registry: Arc<NodeTypeRegistry>,
    flow: Option<Flow>,
    closed: bool,
}

impl SvgBackend {
    pub fn new(registry: Arc<NodeTypeRegistry>) -> Self {
        Self {
            registry,
            flow: None,
            closed: false,
        }
    }
}

#[async_trait::async_trait]
impl RenderBackend for SvgBackend {
    async fn import_flow(&mut self, flow: &Flow) -> FlowdrawResult<()> {
        if self.closed {
            return Err(FlowdrawError::import("Backend has been closed"));
        }
        if self.flow.is_some() {
            return Err(FlowdrawError::import("A flow was already imported"));
        }

        if let Some(node) = flow.dangling_nodes().first() {
            return Err(FlowdrawError::import(format!(
                "Node {} ({}) belongs to unknown workspace {}",
                node.id,
                node.node_type,
                node.z.as_deref().unwrap_or_default()
            )));
        }

        for node in flow.nodes().iter().filter(|n| n.is_drawable() && !n.is_group()) {
            if node.subflow_instance_of().is_none() && !self.registry.contains(&node.node_type) {
                tracing::debug!(node = %node.id, node_type = %node.node_type, "Unknown node type");
            }
        }

        self.flow = Some(flow.clone());
        Ok(())
    }

    fn reports_layout_stable(&self) -> bool {
        true
    }

    fn workspace_ids(&self) -> Vec<String> {
        self.flow
            .as_ref()
            .map(|flow| flow.workspace_ids().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    async fn render_workspace(&mut self, workspace_id: &str) -> FlowdrawResult<Snapshot> {
        let flow = self
            .flow
            .as_ref()
            .ok_or_else(|| FlowdrawError::render("No flow imported"))?;
        let workspace = flow
            .workspace(workspace_id)
            .ok_or_else(|| FlowdrawError::render(format!("Unknown workspace: {workspace_id}")))?;

        let svg = draw_workspace(flow, workspace, &self.registry)?;
        Ok(Snapshot::from_svg(workspace_id, &svg))
    }

    fn close(&mut self) {
        self.flow = None;
        self.closed = true;
    }
}

/// A positioned node, ready to draw.
#[derive(Debug, Clone)]
struct NodeBox {
    label: String,
    color: String,
    known: bool,
    disabled: bool,
    inputs: usize,
    outputs: usize,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl NodeBox {
    fn layout(flow: &Flow, node: &Node, registry: &NodeTypeRegistry) -> Self {
        let (label, color, known, inputs, default_outputs) = match node.subflow_instance_of() {
            Some(template_id) => match flow.node(template_id) {
                Some(template) => {
                    let (inputs, outputs) = template.subflow_ports();
                    let color = template
                        .extra
                        .get("color")
                        .and_then(serde_json::Value::as_str)
                        .unwrap_or(SUBFLOW_INSTANCE_COLOR);
                    let label = node
                        .name
                        .clone()
                        .or_else(|| template.name.clone())
                        .unwrap_or_else(|| "subflow".to_string());
                    (label, color.to_string(), true, inputs, outputs)
                }
                None => (
                    node.name.clone().unwrap_or_else(|| node.node_type.clone()),
                    "#fff".to_string(),
                    false,
                    1,
                    0,
                ),
            },
            None => match registry.lookup(&node.node_type) {
                Some(def) => (
                    node.name
                        .clone()
                        .unwrap_or_else(|| def.display_label().to_string()),
                    def.color.clone(),
                    true,
                    def.inputs.min(1),
                    def.outputs,
                ),
                None => (
                    node.name.clone().unwrap_or_else(|| node.node_type.clone()),
                    "#fff".to_string(),
                    false,
                    1,
                    0,
                ),
            },
        };

        let outputs = if node.wires.is_empty() {
            default_outputs
        } else {
            node.output_count()
        };

        let label_width = label.chars().count() as f64 * LABEL_CHAR_WIDTH + LABEL_PADDING;
        let width = node
            .w
            .unwrap_or_else(|| NODE_WIDTH.max(GRID_SIZE * (label_width / GRID_SIZE).ceil()));
        let height = node
            .h
            .unwrap_or_else(|| NODE_HEIGHT.max(outputs as f64 * OUTPUT_HEIGHT));

        let x = node.x.unwrap_or_default();
        let y = node.y.unwrap_or_default();

        Self {
            label,
            color,
            known,
            disabled: node.is_disabled(),
            inputs,
            outputs,
            left: x - width / 2.0,
            top: y - height / 2.0,
            width,
            height,
        }
    }

    /// Vertical centre of output port `port`, relative to the node top.
    fn output_offset(&self, port: usize) -> f64 {
        self.height / 2.0 - (self.outputs.saturating_sub(1) as f64 / 2.0) * PORT_SPACING
            + PORT_SPACING * port as f64
    }

    /// Absolute point where a wire leaves output `port`.
    fn wire_start(&self, port: usize) -> (f64, f64) {
        (
            self.left + self.width + PORT_SIZE / 2.0,
            self.top + self.output_offset(port),
        )
    }

    /// Absolute point where a wire enters the node.
    fn wire_end(&self) -> (f64, f64) {
        (self.left - PORT_SIZE / 2.0, self.top + self.height / 2.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Bounds {
    fn of(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            min_x: left,
            min_y: top,
            max_x: left + width,
            max_y: top + height,
        }
    }

    fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// Streaming SVG writer. Attribute values and text are escaped on write.
struct Canvas {
    writer: Writer<Vec<u8>>,
}

type Attrs<'a> = [(&'a str, String)];

impl Canvas {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn emit(&mut self, event: Event<'_>) -> FlowdrawResult<()> {
        self.writer
            .write_event(event)
            .map_err(|e| FlowdrawError::render(format!("Failed to write SVG: {e}")))
    }

    fn tag<'a>(name: &'a str, attrs: &Attrs<'_>) -> BytesStart<'a> {
        let mut start = BytesStart::new(name);
        for (key, value) in attrs {
            start.push_attribute((*key, value.as_str()));
        }
        start
    }

    fn open(&mut self, name: &str, attrs: &Attrs<'_>) -> FlowdrawResult<()> {
        self.emit(Event::Start(Self::tag(name, attrs)))
    }

    fn close(&mut self, name: &str) -> FlowdrawResult<()> {
        self.emit(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str, attrs: &Attrs<'_>) -> FlowdrawResult<()> {
        self.emit(Event::Empty(Self::tag(name, attrs)))
    }

    fn text(&mut self, name: &str, attrs: &Attrs<'_>, text: &str) -> FlowdrawResult<()> {
        self.open(name, attrs)?;
        self.emit(Event::Text(BytesText::new(text)))?;
        self.close(name)
    }

    fn finish(self) -> FlowdrawResult<String> {
        String::from_utf8(self.writer.into_inner()).map_err(|e| FlowdrawError::Other(e.into()))
    }
}

fn num(value: f64) -> String {
    value.to_string()
}

/// Render one workspace to an SVG document.
pub(crate) fn draw_workspace(
    flow: &Flow,
    workspace: &Workspace,
    registry: &NodeTypeRegistry,
) -> FlowdrawResult<String> {
    let members: Vec<&Node> = flow
        .nodes_in(&workspace.id)
        .filter(|n| n.has_position())
        .collect();

    let groups: Vec<&Node> = members.iter().copied().filter(|n| n.is_group()).collect();
    let mut boxes: HashMap<&str, NodeBox> = HashMap::new();
    let mut order: Vec<&Node> = Vec::new();
    for node in members.iter().copied().filter(|n| !n.is_group()) {
        boxes.insert(node.id.as_str(), NodeBox::layout(flow, node, registry));
        order.push(node);
    }

    let group_rects = groups.iter().map(|g| {
        Bounds::of(
            g.x.unwrap_or_default(),
            g.y.unwrap_or_default(),
            g.w.unwrap_or_default(),
            g.h.unwrap_or_default(),
        )
    });
    let node_rects = order.iter().map(|n| {
        let b = &boxes[n.id.as_str()];
        Bounds::of(
            b.left - PORT_SIZE,
            b.top,
            b.width + 2.0 * PORT_SIZE,
            b.height,
        )
    });
    let bounds = group_rects
        .chain(node_rects)
        .reduce(Bounds::union)
        .unwrap_or(Bounds::of(0.0, 0.0, 0.0, 0.0));

    let view_x = num(bounds.min_x - CANVAS_MARGIN);
    let view_y = num(bounds.min_y - CANVAS_MARGIN);
    let width = num(bounds.max_x - bounds.min_x + 2.0 * CANVAS_MARGIN);
    let height = num(bounds.max_y - bounds.min_y + 2.0 * CANVAS_MARGIN);

    let mut canvas = Canvas::new();
    canvas.open(
        "svg",
        &[
            ("xmlns", SVG_NAMESPACE.to_string()),
            ("width", width.clone()),
            ("height", height.clone()),
            ("viewBox", format!("{view_x} {view_y} {width} {height}")),
            ("data-workspace", workspace.id.clone()),
        ],
    )?;
    canvas.text("title", &[], &workspace.label)?;
    canvas.text("style", &[], STYLE)?;
    canvas.empty(
        "rect",
        &[
            ("class", "background".to_string()),
            ("x", view_x),
            ("y", view_y),
            ("width", width),
            ("height", height),
            ("fill", "#fff".to_string()),
        ],
    )?;

    if workspace.disabled {
        canvas.open(
            "g",
            &[
                ("class", "workspace disabled".to_string()),
                ("opacity", "0.5".to_string()),
            ],
        )?;
    } else {
        canvas.open("g", &[("class", "workspace".to_string())])?;
    }

    for group in &groups {
        draw_group(&mut canvas, group)?;
    }

    for node in &order {
        let source = &boxes[node.id.as_str()];
        for wire in flow.wires_from(node) {
            let Some(target) = boxes.get(wire.target.id.as_str()) else {
                continue;
            };
            draw_wire(&mut canvas, source.wire_start(wire.port), target.wire_end())?;
        }
    }

    for node in &order {
        draw_node(&mut canvas, &node.id, &boxes[node.id.as_str()])?;
    }

    canvas.close("g")?;
    canvas.close("svg")?;
    canvas.finish()
}

fn draw_group(canvas: &mut Canvas, group: &Node) -> FlowdrawResult<()> {
    let style = group.extra.get("style");
    let style_value = |key: &str, fallback: &'static str| -> String {
        style
            .and_then(|s| s.get(key))
            .and_then(serde_json::Value::as_str)
            .unwrap_or(fallback)
            .to_string()
    };
    let x = group.x.unwrap_or_default();
    let y = group.y.unwrap_or_default();

    canvas.open(
        "g",
        &[("class", "group".to_string()), ("data-id", group.id.clone())],
    )?;
    canvas.empty(
        "rect",
        &[
            ("x", num(x)),
            ("y", num(y)),
            ("width", num(group.w.unwrap_or_default())),
            ("height", num(group.h.unwrap_or_default())),
            ("rx", "1".to_string()),
            ("fill", style_value("fill", "none")),
            ("stroke", style_value("stroke", "#999")),
        ],
    )?;
    if let Some(name) = &group.name {
        canvas.text("text", &[("x", num(x + 10.0)), ("y", num(y + 20.0))], name)?;
    }
    canvas.close("g")
}

fn draw_wire(canvas: &mut Canvas, (x1, y1): (f64, f64), (x2, y2): (f64, f64)) -> FlowdrawResult<()> {
    let offset = ((x2 - x1).abs() * LINE_CURVE_SCALE).max(MIN_CURVE_OFFSET);
    canvas.empty(
        "path",
        &[
            ("class", "wire".to_string()),
            (
                "d",
                format!(
                    "M {x1} {y1} C {} {y1} {} {y2} {x2} {y2}",
                    x1 + offset,
                    x2 - offset
                ),
            ),
        ],
    )
}

fn draw_port(canvas: &mut Canvas, class: &str, x: f64, y: f64) -> FlowdrawResult<()> {
    canvas.empty(
        "rect",
        &[
            ("class", class.to_string()),
            ("x", num(x)),
            ("y", num(y)),
            ("width", num(PORT_SIZE)),
            ("height", num(PORT_SIZE)),
            ("rx", "3".to_string()),
            ("ry", "3".to_string()),
        ],
    )
}

fn draw_node(canvas: &mut Canvas, id: &str, node: &NodeBox) -> FlowdrawResult<()> {
    let class = if node.known { "node" } else { "node unknown" };
    let mut attrs = vec![
        ("class", class.to_string()),
        ("data-id", id.to_string()),
        ("transform", format!("translate({},{})", node.left, node.top)),
    ];
    if node.disabled {
        attrs.push(("opacity", "0.4".to_string()));
    }
    canvas.open("g", &attrs)?;

    canvas.empty(
        "rect",
        &[
            ("class", "body".to_string()),
            ("width", num(node.width)),
            ("height", num(node.height)),
            ("rx", "5".to_string()),
            ("ry", "5".to_string()),
            ("fill", node.color.clone()),
        ],
    )?;
    canvas.text(
        "text",
        &[
            ("x", num(node.width / 2.0)),
            ("y", num(node.height / 2.0)),
            ("text-anchor", "middle".to_string()),
            ("dominant-baseline", "middle".to_string()),
        ],
        &node.label,
    )?;

    if node.inputs > 0 {
        draw_port(
            canvas,
            "port input",
            -PORT_SIZE / 2.0,
            node.height / 2.0 - PORT_SIZE / 2.0,
        )?;
    }
    for port in 0..node.outputs {
        draw_port(
            canvas,
            "port output",
            node.width - PORT_SIZE / 2.0,
            node.output_offset(port) - PORT_SIZE / 2.0,
        )?;
    }

    canvas.close("g")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Arc<NodeTypeRegistry> {
        Arc::new(NodeTypeRegistry::with_core_types())
    }

    fn flow(raw: &str) -> Flow {
        Flow::parse(raw.as_bytes()).unwrap()
    }

    fn svg_of(snapshot: &Snapshot) -> String {
        String::from_utf8(snapshot.decode().unwrap().bytes).unwrap()
    }

    const SIMPLE: &str = r#"[
        {"id":"t1","type":"tab","label":"Main <flow>"},
        {"id":"a","type":"inject","z":"t1","name":"tick","x":100,"y":80,"wires":[["b"]]},
        {"id":"b","type":"debug","z":"t1","x":300,"y":80,"wires":[]},
        {"id":"c","type":"acme-widget","z":"t1","x":300,"y":160,"d":true,"wires":[]}
    ]"#;

    #[tokio::test]
    async fn test_render_simple_workspace() {
        let mut backend = SvgBackend::new(registry());
        backend.import_flow(&flow(SIMPLE)).await.unwrap();

        let snapshot = backend.render_workspace("t1").await.unwrap();
        assert_eq!(snapshot.workspace_id, "t1");

        let svg = svg_of(&snapshot);
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("<title>Main &lt;flow"));
        assert!(svg.contains(">tick</text>"));
        assert!(svg.contains(">debug</text>"));
        assert_eq!(svg.matches("class=\"wire\"").count(), 1);
        assert!(svg.contains("class=\"node unknown\" data-id=\"c\""));
        assert!(svg.contains("opacity=\"0.4\""));
    }

    #[tokio::test]
    async fn test_render_is_deterministic() {
        let mut first = SvgBackend::new(registry());
        first.import_flow(&flow(SIMPLE)).await.unwrap();
        let mut second = SvgBackend::new(registry());
        second.import_flow(&flow(SIMPLE)).await.unwrap();

        assert_eq!(
            first.render_workspace("t1").await.unwrap(),
            second.render_workspace("t1").await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_unknown_workspace_is_a_render_error() {
        let mut backend = SvgBackend::new(registry());
        backend.import_flow(&flow(SIMPLE)).await.unwrap();
        let err = backend.render_workspace("nope").await.unwrap_err();
        assert!(matches!(err, FlowdrawError::Render { .. }));
    }

    #[tokio::test]
    async fn test_render_before_import_fails() {
        let mut backend = SvgBackend::new(registry());
        let err = backend.render_workspace("t1").await.unwrap_err();
        assert!(matches!(err, FlowdrawError::Render { .. }));
    }

    #[tokio::test]
    async fn test_dangling_workspace_reference_is_rejected_at_import() {
        let mut backend = SvgBackend::new(registry());
        let raw = r#"[{"id":"t1","type":"tab"},{"id":"a","type":"inject","z":"t2","x":1,"y":1}]"#;
        let err = backend.import_flow(&flow(raw)).await.unwrap_err();
        assert!(matches!(err, FlowdrawError::Import { .. }));
    }

    #[tokio::test]
    async fn test_closed_backend_rejects_import() {
        let mut backend = SvgBackend::new(registry());
        backend.close();
        backend.close();
        let err = backend.import_flow(&flow(SIMPLE)).await.unwrap_err();
        assert!(matches!(err, FlowdrawError::Import { .. }));
    }

    #[tokio::test]
    async fn test_subflow_instance_uses_template_ports_and_name() {
        let raw = r##"[
            {"id":"sf","type":"subflow","name":"Cleaner","color":"#abcdef","in":[{}],"out":[{},{}]},
            {"id":"inner","type":"function","z":"sf","x":50,"y":50,"wires":[]},
            {"id":"t1","type":"tab","label":"T"},
            {"id":"i1","type":"subflow:sf","z":"t1","x":200,"y":100,"wires":[[],[]]}
        ]"##;
        let mut backend = SvgBackend::new(registry());
        backend.import_flow(&flow(raw)).await.unwrap();
        let svg = svg_of(&backend.render_workspace("t1").await.unwrap());

        assert!(svg.contains(">Cleaner</text>"));
        assert!(svg.contains("fill=\"#abcdef\""));
        assert_eq!(svg.matches("class=\"port output\"").count(), 2);
        assert_eq!(svg.matches("class=\"port input\"").count(), 1);
        assert!(!svg.contains("data-id=\"inner\""));
    }

    #[tokio::test]
    async fn test_groups_are_drawn_behind_nodes() {
        let raw = r##"[
            {"id":"t1","type":"tab"},
            {"id":"g1","type":"group","z":"t1","name":"Inputs","x":20,"y":20,"w":200,"h":100,"style":{"stroke":"#3f93cf"}},
            {"id":"a","type":"inject","z":"t1","x":100,"y":60,"wires":[]}
        ]"##;
        let mut backend = SvgBackend::new(registry());
        backend.import_flow(&flow(raw)).await.unwrap();
        let svg = svg_of(&backend.render_workspace("t1").await.unwrap());

        let group_at = svg.find("class=\"group\"").unwrap();
        let node_at = svg.find("data-id=\"a\"").unwrap();
        assert!(group_at < node_at);
        assert!(svg.contains("stroke=\"#3f93cf\""));
        assert!(svg.contains(">Inputs</text>"));
    }

    #[tokio::test]
    async fn test_empty_workspace_still_renders() {
        let mut backend = SvgBackend::new(registry());
        backend
            .import_flow(&flow(r#"[{"id":"t1","type":"tab","label":"Empty"}]"#))
            .await
            .unwrap();
        let svg = svg_of(&backend.render_workspace("t1").await.unwrap());
        assert!(svg.contains("<title>Empty</title>"));
        assert!(!svg.contains("class=\"node"));
    }

    #[test]
    fn test_node_width_grows_with_label() {
        let registry = NodeTypeRegistry::with_core_types();
        let raw = r#"[
            {"id":"t","type":"tab"},
            {"id":"s","type":"inject","z":"t","name":"a","x":0,"y":0},
            {"id":"l","type":"inject","z":"t","name":"a much longer label here","x":0,"y":0}
        ]"#;
        let flow = flow(raw);
        let short = NodeBox::layout(&flow, flow.node("s").unwrap(), &registry);
        let long = NodeBox::layout(&flow, flow.node("l").unwrap(), &registry);
        assert_eq!(short.width, NODE_WIDTH);
        assert!(long.width > NODE_WIDTH);
        assert_eq!(long.width % GRID_SIZE, 0.0);
    }

    #[test]
    fn test_output_ports_are_centred() {
        let registry = NodeTypeRegistry::with_core_types();
        let raw = r#"[
            {"id":"t","type":"tab"},
            {"id":"s","type":"switch","z":"t","x":100,"y":100,"wires":[[],[],[]]}
        ]"#;
        let flow = flow(raw);
        let node = NodeBox::layout(&flow, flow.node("s").unwrap(), &registry);
        assert_eq!(node.outputs, 3);
        assert_eq!(node.height, 45.0);
        assert_eq!(node.output_offset(1), node.height / 2.0);
        assert_eq!(node.output_offset(2) - node.output_offset(0), 2.0 * PORT_SPACING);
    }

    #[tokio::test]
    async fn test_markup_in_labels_and_styles_is_escaped() {
        let raw = r##"[
            {"id":"t1","type":"tab","label":"R&D <main>"},
            {"id":"g1","type":"group","z":"t1","name":"a < b","x":0,"y":0,"w":50,"h":50,"style":{"stroke":"\"/><script/>"}},
            {"id":"q\"x","type":"inject","z":"t1","name":"x & y","x":100,"y":60,"wires":[]}
        ]"##;
        let mut backend = SvgBackend::new(registry());
        backend.import_flow(&flow(raw)).await.unwrap();
        let svg = svg_of(&backend.render_workspace("t1").await.unwrap());

        assert!(svg.contains("<title>R&amp;D &lt;main"));
        assert!(svg.contains(">a &lt; b</text>"));
        assert!(svg.contains(">x &amp; y</text>"));
        assert!(svg.contains("data-id=\"q&quot;x\""));
        assert!(!svg.contains("<script"));

        let mut reader = quick_xml::Reader::from_str(&svg);
        let mut elements = 0;
        loop {
            match reader.read_event().unwrap() {
                Event::Eof => break,
                Event::Start(_) | Event::Empty(_) => elements += 1,
                _ => {}
            }
        }
        assert!(elements > 5);
    }
}
