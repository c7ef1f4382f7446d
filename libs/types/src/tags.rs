//! FIX tag numbers used by the pipeline and their dictionary names

pub const BEGIN_STRING: &str = "8";
pub const BODY_LENGTH: &str = "9";
pub const CHECKSUM: &str = "10";
pub const CL_ORD_ID: &str = "11";
pub const HANDL_INST: &str = "21";
pub const MSG_SEQ_NUM: &str = "34";
pub const MSG_TYPE: &str = "35";
pub const ORDER_QTY: &str = "38";
pub const ORD_TYPE: &str = "40";
pub const PRICE: &str = "44";
pub const SENDER_COMP_ID: &str = "49";
pub const SENDING_TIME: &str = "52";
pub const SIDE: &str = "54";
pub const SYMBOL: &str = "55";
pub const TARGET_COMP_ID: &str = "56";
pub const TIME_IN_FORCE: &str = "59";

/// Side (54) value for a buy order.
pub const SIDE_BUY: &str = "1";
/// Side (54) value for a sell order.
pub const SIDE_SELL: &str = "2";

/// Header marker that starts every FIX 4.4 message.
pub const FIX44_HEADER: &str = "8=FIX.4.4";

const DICTIONARY: &[(&str, &str)] = &[
    (BEGIN_STRING, "BeginString"),
    (BODY_LENGTH, "BodyLength"),
    (MSG_TYPE, "MsgType"),
    (MSG_SEQ_NUM, "MsgSeqNum"),
    (SENDER_COMP_ID, "SenderCompID"),
    (TARGET_COMP_ID, "TargetCompID"),
    (SENDING_TIME, "SendingTime"),
    (CL_ORD_ID, "ClOrdID"),
    (HANDL_INST, "HandlInst"),
    (SYMBOL, "Symbol"),
    (SIDE, "Side"),
    (ORDER_QTY, "OrderQty"),
    (ORD_TYPE, "OrdType"),
    (PRICE, "Price"),
    (TIME_IN_FORCE, "TimeInForce"),
    (CHECKSUM, "CheckSum"),
];

/// Dictionary name for a tag, if the tag is known.
pub fn tag_name(tag: &str) -> Option<&'static str> {
    DICTIONARY
        .iter()
        .find(|(number, _)| *number == tag)
        .map(|(_, name)| *name)
}

/// Dictionary name for a tag, or `Unknown(<tag>)` for tags outside it.
pub fn display_name(tag: &str) -> String {
    match tag_name(tag) {
        Some(name) => name.to_string(),
        None => format!("Unknown({})", tag),
    }
}
