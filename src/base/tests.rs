use crate::base::neterror::NetError;

#[test]
fn test_net_error_roundtrip() {
    let original = NetError::ConnectionRefused;
    let code = original.as_i32();
    assert_eq!(code, -102);
    let converted = NetError::from(code);
    assert!(matches!(converted, NetError::ConnectionRefused));

    let redirect = NetError::TooManyRedirects;
    assert_eq!(redirect.as_i32(), -310);
    assert_eq!(NetError::from(-310), NetError::TooManyRedirects);

    // Crate specific
    let custom = NetError::RequestAlreadySent;
    let custom_code = custom.as_i32();
    assert_eq!(custom_code, -901);
    assert!(matches!(
        NetError::from(custom_code),
        NetError::RequestAlreadySent
    ));
}

#[test]
fn test_unknown_error() {
    let err = NetError::from(-9999);
    assert!(matches!(err, NetError::Unknown(-9999)));
    assert_eq!(err.as_i32(), -9999);
}

#[test]
fn test_transient_classification() {
    assert!(NetError::ConnectionReset.is_transient());
    assert!(NetError::ConnectionTimedOut.is_transient());
    assert!(!NetError::NameNotResolved.is_transient());
    assert!(!NetError::TooManyRedirects.is_transient());
    assert!(!NetError::InvalidHeader.is_transient());
}

#[test]
fn test_unproduced_chromium_codes_are_unknown() {
    assert_eq!(NetError::from(-106), NetError::Unknown(-106));
    assert_eq!(NetError::from(-330), NetError::Unknown(-330));
    assert_eq!(NetError::from(-354), NetError::ContentLengthMismatch);
}
