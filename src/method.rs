use alloy_primitives::{hex, keccak256, Bytes, Selector};

use crate::{
    align::WORD_SIZE,
    decode_params,
    encode_params,
    error::{CodecError, DecodingError, Result},
    types::{AbiType, AbiValue},
    EncodingOptions,
};

/// A named function parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: AbiType,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: AbiType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A contract function: encodes full calldata (selector followed by the
/// parameters) and decodes it back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Method {
    name: String,
    inputs: Vec<Param>,
    types: Vec<AbiType>,
}

impl Method {
    pub fn new(name: impl Into<String>, inputs: Vec<Param>) -> Result<Self> {
        for input in &inputs {
            input.ty.validate()?;
        }
        let types = inputs.iter().map(|input| input.ty.clone()).collect();
        Ok(Self {
            name: name.into(),
            inputs,
            types,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[Param] {
        &self.inputs
    }

    /// `name(type1,type2,...)`
    pub fn signature(&self) -> String {
        let types: Vec<String> = self.types.iter().map(ToString::to_string).collect();
        format!("{}({})", self.name, types.join(","))
    }

    pub fn selector(&self) -> Selector {
        Selector::from_slice(&keccak256(self.signature().as_bytes())[..4])
    }

    pub fn encode(&self, values: &[AbiValue], options: &EncodingOptions) -> Result<Bytes> {
        let params = encode_params(&self.types, values, options)?;
        let mut calldata = Vec::with_capacity(4 + params.len());
        calldata.extend_from_slice(self.selector().as_slice());
        calldata.extend_from_slice(&params);
        Ok(calldata.into())
    }

    pub fn decode(&self, calldata: &[u8]) -> Result<Vec<AbiValue>> {
        if calldata.len() < 4 {
            return Err(CodecError::truncated(4, calldata.len(), "missing function selector"));
        }
        let (selector, params) = calldata.split_at(4);
        let found = Selector::from_slice(selector);
        let expected = self.selector();
        if found != expected {
            return Err(DecodingError::SelectorMismatch { expected, found }.into());
        }
        decode_params(&self.types, params)
    }

    /// Human-readable dump of the calldata: the signature and selector, then
    /// every parameter word with its offset.
    pub fn annotate(&self, values: &[AbiValue], options: &EncodingOptions) -> Result<String> {
        let params = encode_params(&self.types, values, options)?;
        let mut out = format!("{} {}\n", self.selector(), self.signature());
        for (i, word) in params.chunks(WORD_SIZE).enumerate() {
            out.push_str(&format!("{:#06x} {}\n", i * WORD_SIZE, hex::encode(word)));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, U256};
    use hex_literal::hex;

    fn transfer() -> Method {
        Method::new(
            "transfer",
            vec![
                Param::new("to", AbiType::Address),
                Param::new("amount", AbiType::Uint(256)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_signature_and_selector() {
        let method = transfer();
        assert_eq!(method.signature(), "transfer(address,uint256)");
        assert_eq!(method.selector(), Selector::from(hex!("a9059cbb")));

        let nested = Method::new(
            "f",
            vec![Param::new(
                "x",
                AbiType::array(AbiType::Tuple(vec![AbiType::String, AbiType::Int(8)])),
            )],
        )
        .unwrap();
        assert_eq!(nested.signature(), "f((string,int8)[])");
    }

    #[test]
    fn test_encode_decode_calldata() {
        let method = transfer();
        let values = vec![
            AbiValue::Address(address!("00000000000000000000000000000000deadbeef")),
            AbiValue::Uint(U256::from(1000)),
        ];
        let calldata = method.encode(&values, &EncodingOptions::default()).unwrap();
        assert_eq!(calldata.len(), 4 + 64);
        assert_eq!(calldata[..4], hex!("a9059cbb"));
        assert_eq!(method.decode(&calldata).unwrap(), values);
    }

    #[test]
    fn test_decode_rejects_foreign_selector() {
        let method = transfer();
        let mut calldata = method
            .encode(
                &[AbiValue::Address(Default::default()), AbiValue::uint(1)],
                &EncodingOptions::default(),
            )
            .unwrap()
            .to_vec();
        calldata[0] ^= 0xff;
        let err = method.decode(&calldata).unwrap_err();
        assert!(matches!(err, CodecError::Decoding(DecodingError::SelectorMismatch { .. })));

        let err = method.decode(&calldata[..3]).unwrap_err();
        assert!(matches!(err, CodecError::Decoding(DecodingError::TruncatedInput { .. })));
    }

    #[test]
    fn test_invalid_param_type() {
        let err = Method::new("f", vec![Param::new("x", AbiType::Uint(12))]).unwrap_err();
        assert!(matches!(err, CodecError::Encoding(crate::error::EncodingError::InvalidType(_))));
    }

    #[test]
    fn test_annotate() {
        let method = Method::new(
            "f",
            vec![Param::new("a", AbiType::String), Param::new("b", AbiType::String)],
        )
        .unwrap();
        let values: [AbiValue; 2] = ["Hello".into(), "Hello".into()];
        let text = method
            .annotate(&values, &EncodingOptions::default().with_optimize(true))
            .unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].ends_with("f(string,string)"));
        assert_eq!(
            lines[1],
            "0x0000 0000000000000000000000000000000000000000000000000000000000000040"
        );
        assert_eq!(
            lines[4],
            "0x0060 48656c6c6f000000000000000000000000000000000000000000000000000000"
        );
    }
}
