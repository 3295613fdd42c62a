/// Names a category of occurrence and fixes the payload type it carries.
///
/// A topic is a plain marker type; the bus keys its registry on the topic's
/// [`TypeId`](std::any::TypeId), so publishing a payload of the wrong type
/// for a topic is rejected at compile time rather than at dispatch.
///
/// Two topics may share a payload type and remain distinct identifiers:
///
/// ```
/// use crier::Topic;
///
/// struct Scored;
/// impl Topic for Scored {
///     type Payload = u32;
/// }
///
/// struct LivesLost;
/// impl Topic for LivesLost {
///     type Payload = u32;
/// }
/// ```
pub trait Topic: 'static {
    /// Payload handed to every subscriber of this topic.
    type Payload: Send + Sync + 'static;

    /// Label used in logs and metrics. Defaults to the type name.
    fn label() -> &'static str {
        std::any::type_name::<Self>()
    }
}
