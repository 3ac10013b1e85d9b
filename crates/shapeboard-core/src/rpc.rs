//! Registry RPC protocol.
//!
//! Requests and responses are JSON text frames over a WebSocket:
//! ```json
//! { "requestId": 1, "call": { "method": "addShape", "params": { "shapeType": "circle", "x": 10, "y": 20, "color": "#ff0000", "size": 50 } } }
//! { "requestId": 1, "result": { "Ok": { "type": "id", "value": 0 } } }
//! ```

use crate::registry::{Registry, RegistryError, RegistryResult};
use crate::shapes::{Geometry, GeometryUpdate, NewShape, Shape, ShapeId, ShapeRecord, ShapeType};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Parameters of `addShape`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddShapeParams {
    pub shape_type: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_y: Option<f64>,
}

impl From<&NewShape> for AddShapeParams {
    fn from(shape: &NewShape) -> Self {
        let origin = shape.geometry.origin();
        let end = shape.geometry.end();
        Self {
            shape_type: shape.geometry.shape_type().as_str().to_string(),
            x: origin.x,
            y: origin.y,
            color: shape.color.clone(),
            size: shape.geometry.size(),
            end_x: end.map(|p| p.x),
            end_y: end.map(|p| p.y),
        }
    }
}

impl TryFrom<AddShapeParams> for NewShape {
    type Error = RegistryError;

    fn try_from(params: AddShapeParams) -> Result<Self, Self::Error> {
        let shape_type: ShapeType = params.shape_type.parse()?;
        let end = crate::shapes::record::end_point(params.end_x, params.end_y)?;
        let geometry = Geometry::from_parts(shape_type, Point::new(params.x, params.y), params.size, end)?;
        Ok(NewShape::new(params.color, geometry))
    }
}

/// Parameters of `updateShape`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShapeParams {
    pub id: ShapeId,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_y: Option<f64>,
}

impl UpdateShapeParams {
    pub fn new(id: ShapeId, update: &GeometryUpdate) -> Self {
        Self {
            id,
            x: update.origin.x,
            y: update.origin.y,
            size: update.size,
            end_x: update.end.map(|p| p.x),
            end_y: update.end.map(|p| p.y),
        }
    }

    pub fn to_update(&self) -> RegistryResult<GeometryUpdate> {
        Ok(GeometryUpdate {
            origin: Point::new(self.x, self.y),
            size: self.size,
            end: crate::shapes::record::end_point(self.end_x, self.end_y)?,
        })
    }
}

/// A registry method and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum RpcCall {
    AddShape(AddShapeParams),
    UpdateShape(UpdateShapeParams),
    DeleteShape { id: ShapeId },
    ClearCanvas,
    GetCanvas,
    UpdateCanvas { shapes: Vec<ShapeRecord> },
}

impl RpcCall {
    pub fn method_name(&self) -> &'static str {
        match self {
            RpcCall::AddShape(_) => "addShape",
            RpcCall::UpdateShape(_) => "updateShape",
            RpcCall::DeleteShape { .. } => "deleteShape",
            RpcCall::ClearCanvas => "clearCanvas",
            RpcCall::GetCanvas => "getCanvas",
            RpcCall::UpdateCanvas { .. } => "updateCanvas",
        }
    }

    /// Run this call against a registry.
    pub async fn dispatch(self, registry: &dyn Registry) -> RegistryResult<RpcReply> {
        match self {
            RpcCall::AddShape(params) => {
                let shape = NewShape::try_from(params)?;
                registry.add_shape(shape).await.map(RpcReply::Id)
            }
            RpcCall::UpdateShape(params) => {
                let update = params.to_update()?;
                registry.update_shape(params.id, update).await.map(|_| RpcReply::Unit)
            }
            RpcCall::DeleteShape { id } => registry.delete_shape(id).await.map(|_| RpcReply::Unit),
            RpcCall::ClearCanvas => registry.clear_canvas().await.map(|_| RpcReply::Unit),
            RpcCall::GetCanvas => {
                let shapes = registry.get_canvas().await?;
                Ok(RpcReply::Canvas(shapes.into_iter().map(ShapeRecord::from).collect()))
            }
            RpcCall::UpdateCanvas { shapes } => {
                let shapes = shapes
                    .into_iter()
                    .map(Shape::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                registry.update_canvas(shapes).await.map(|_| RpcReply::Unit)
            }
        }
    }
}

/// Successful result of a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RpcReply {
    Id(ShapeId),
    Unit,
    Canvas(Vec<ShapeRecord>),
}

/// A request frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcRequest {
    /// Echoed back in the response.
    pub request_id: u64,
    pub call: RpcCall,
}

/// A response frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcResponse {
    pub request_id: u64,
    pub result: Result<RpcReply, RegistryError>,
}

impl RpcResponse {
    /// Response to a frame that could not be parsed.
    pub fn malformed(err: impl std::fmt::Display) -> Self {
        Self {
            request_id: 0,
            result: Err(RegistryError::TransportFailure(format!("Invalid request: {}", err))),
        }
    }
}
