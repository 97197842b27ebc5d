mod http;
mod viewport;

pub use self::http::{
    decode_body, decode_http_result, ApiRequest, HttpCapability, MAX_REQUEST_BODY_SIZE,
    MAX_RESPONSE_BODY_SIZE, REQUEST_ID_HEADER,
};
pub use self::viewport::{Viewport, ViewportCapability, ViewportOperation};

pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::event::Event;
// the Effect derive wires capabilities to an app type named `App`
use crate::App;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
    pub viewport: Viewport<Event>,
}
