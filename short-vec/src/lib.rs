//! Compact serde-encoding of vectors with small length.
//!
//! Wire messages prefix every variable-length sequence with its element
//! count, encoded in as few bytes as possible: seven bits of the count per
//! byte, least-significant group first, with the high bit of each byte
//! marking that another byte follows. Counts below 128 therefore cost a
//! single byte.
//!
//! Annotate a `Vec` field with `#[serde(with = "solana_short_vec")]` to get
//! this framing through serde, or use [`encode_len`]/[`decode_len`] when
//! assembling wire bytes by hand.

use {
    serde::{
        de::{self, Deserialize, Deserializer, SeqAccess, Visitor},
        ser::{self, Serialize, SerializeTuple, Serializer},
    },
    std::{
        fmt,
        io::{self, Read, Write},
        marker::PhantomData,
        mem::size_of,
    },
};

/// Maximum number of bytes a `u16` count can occupy on the wire.
const MAX_ENCODING_LENGTH: usize = 3;

/// Same as u16, but serialized with 1 to 3 bytes.
///
/// If the value is above 0x7f, the top bit is set and the remaining value is
/// stored in the next bytes. Each byte follows the same pattern until the
/// third byte, which holds whatever bits remain with the top bit clear.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShortU16(pub u16);

impl Serialize for ShortU16 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Pass a non-zero value to serialize_tuple() so that serde_json will
        // open a bracket.
        let mut seq = serializer.serialize_tuple(1)?;
        let mut rem_val = self.0;
        loop {
            let mut elem = (rem_val & 0x7f) as u8;
            rem_val >>= 7;
            if rem_val == 0 {
                seq.serialize_element(&elem)?;
                break;
            } else {
                elem |= 0x80;
                seq.serialize_element(&elem)?;
            }
        }
        seq.end()
    }
}

enum VisitStatus {
    Done(u16),
    More(u16),
}

#[derive(Debug)]
enum VisitError {
    TooLong(usize),
    TooShort(usize),
    Overflow(u32),
    Alias,
    ByteThreeContinues,
}

impl fmt::Display for VisitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VisitError::TooLong(len) => write!(f, "too long: {len} bytes"),
            VisitError::TooShort(len) => write!(f, "too short: {len} bytes"),
            VisitError::Overflow(val) => write!(f, "overflow: {val}"),
            VisitError::Alias => write!(f, "alias encoding"),
            VisitError::ByteThreeContinues => {
                write!(f, "byte three continues")
            }
        }
    }
}

fn visit_byte(elem: u8, val: u16, nth_byte: usize) -> Result<VisitStatus, VisitError> {
    if elem == 0 && nth_byte != 0 {
        return Err(VisitError::Alias);
    }

    let val = u32::from(val);
    let elem = u32::from(elem);
    let elem_val = elem & 0x7f;
    let elem_done = (elem & 0x80) == 0;

    if nth_byte >= MAX_ENCODING_LENGTH {
        return Err(VisitError::TooLong(nth_byte.saturating_add(1)));
    } else if nth_byte == MAX_ENCODING_LENGTH.saturating_sub(1) && !elem_done {
        return Err(VisitError::ByteThreeContinues);
    }

    let shift = u32::try_from(nth_byte)
        .unwrap_or(u32::MAX)
        .saturating_mul(7);
    let shifted_elem_val = elem_val.checked_shl(shift).unwrap_or(u32::MAX);

    let new_val = val | shifted_elem_val;
    let val = u16::try_from(new_val).map_err(|_| VisitError::Overflow(new_val))?;

    if elem_done {
        Ok(VisitStatus::Done(val))
    } else {
        Ok(VisitStatus::More(val))
    }
}

struct ShortU16Visitor;

impl<'de> Visitor<'de> for ShortU16Visitor {
    type Value = ShortU16;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a ShortU16")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<ShortU16, A::Error>
    where
        A: SeqAccess<'de>,
    {
        // Decodes an unsigned 16 bit integer one-to-one encoded as follows:
        // 1 byte  : 0xxxxxxx => 00000000 0xxxxxxx : 0 - 127
        // 2 bytes : 1xxxxxxx 0yyyyyyy => 00yyyyyy yxxxxxxx : 128 - 16,383
        // 3 bytes : 1xxxxxxx 1yyyyyyy 000000zz => zzyyyyyy yxxxxxxx : 16,384 - 65,535
        let mut val: u16 = 0;
        for nth_byte in 0..MAX_ENCODING_LENGTH {
            let elem: u8 = seq.next_element()?.ok_or_else(|| {
                de::Error::custom(VisitError::TooShort(nth_byte.saturating_add(1)))
            })?;
            match visit_byte(elem, val, nth_byte).map_err(de::Error::custom)? {
                VisitStatus::Done(new_val) => return Ok(ShortU16(new_val)),
                VisitStatus::More(new_val) => val = new_val,
            }
        }

        Err(de::Error::custom(VisitError::ByteThreeContinues))
    }
}

impl<'de> Deserialize<'de> for ShortU16 {
    fn deserialize<D>(deserializer: D) -> Result<ShortU16, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_tuple(MAX_ENCODING_LENGTH, ShortU16Visitor)
    }
}

/// If you don't want to use the ShortVec newtype, you can do ShortVec
/// serialization on an ordinary vector with the following field annotation:
///
/// #[serde(with = "solana_short_vec")]
///
pub fn serialize<S: Serializer, T: Serialize>(
    elements: &[T],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    // Pass a non-zero value to serialize_tuple() so that serde_json will
    // open a bracket.
    let mut seq = serializer.serialize_tuple(1)?;

    let len = elements.len();
    if len > usize::from(u16::MAX) {
        return Err(ser::Error::custom("length larger than u16"));
    }
    let short_len = ShortU16(len as u16);
    seq.serialize_element(&short_len)?;

    for element in elements {
        seq.serialize_element(element)?;
    }
    seq.end()
}

struct ShortVecVisitor<T> {
    _t: PhantomData<T>,
}

impl<'de, T> Visitor<'de> for ShortVecVisitor<T>
where
    T: Deserialize<'de>,
{
    type Value = Vec<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a Vec with a multi-byte length")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Vec<T>, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let short_len: ShortU16 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let len = usize::from(short_len.0);

        let mut result = Vec::with_capacity(len);
        for i in 0..len {
            let elem = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(i.saturating_add(1), &self))?;
            result.push(elem);
        }
        Ok(result)
    }
}

/// Deserializes a vector prefixed by its ShortU16-encoded length.
pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let visitor = ShortVecVisitor { _t: PhantomData };
    deserializer.deserialize_tuple(usize::MAX, visitor)
}

/// A `Vec` that serializes with a compact length prefix.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShortVec<T>(pub Vec<T>);

impl<T: Serialize> Serialize for ShortVec<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize(&self.0, serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ShortVec<T> {
    fn deserialize<D>(deserializer: D) -> Result<ShortVec<T>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize(deserializer).map(ShortVec)
    }
}

/// Writes the compact form of `len` to `writer`.
pub fn encode_len<W: Write>(writer: &mut W, len: usize) -> io::Result<()> {
    let mut rem_len = len;
    loop {
        let mut elem = (rem_len & 0x7f) as u8;
        rem_len >>= 7;
        if rem_len == 0 {
            writer.write_all(&[elem])?;
            break;
        } else {
            elem |= 0x80;
            writer.write_all(&[elem])?;
        }
    }
    Ok(())
}

/// Reads a length written by [`encode_len`].
pub fn decode_len<R: Read>(reader: &mut R) -> io::Result<usize> {
    let mut len: usize = 0;
    let mut size: usize = 0;
    loop {
        let mut elem = [0u8; 1];
        reader.read_exact(&mut elem)?;
        len |= usize::from(elem[0] & 0x7f) << (size.saturating_mul(7));
        size = size.saturating_add(1);
        if elem[0] & 0x80 == 0 {
            break;
        }
        if size > size_of::<usize>().saturating_add(1) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "multi-byte length is too long",
            ));
        }
    }
    Ok(len)
}

/// Returns the number of bytes [`encode_len`] emits for `len`.
pub fn encoded_len_size(len: usize) -> usize {
    let mut size = 1;
    let mut rem_len = len >> 7;
    while rem_len != 0 {
        size += 1;
        rem_len >>= 7;
    }
    size
}

/// Decodes a ShortU16 length from the front of `bytes`, returning the value
/// and the number of bytes it occupied.
pub fn decode_shortu16_len(bytes: &[u8]) -> Result<(usize, usize), ()> {
    let mut val = 0;
    for (nth_byte, byte) in bytes.iter().take(MAX_ENCODING_LENGTH).enumerate() {
        match visit_byte(*byte, val, nth_byte).map_err(|_| ())? {
            VisitStatus::Done(val) => {
                return Ok((usize::from(val), nth_byte.saturating_add(1)))
            }
            VisitStatus::More(new_val) => val = new_val,
        }
    }
    Err(())
}

#[cfg(test)]
mod tests {
    use {super::*, assert_matches::assert_matches, serde_derive::Deserialize, std::io::Cursor};

    /// Return the serialized length.
    fn encode_len_to_vec(len: u16) -> Vec<u8> {
        bincode::serialize(&ShortU16(len)).unwrap()
    }

    fn assert_len_encoding(len: u16, bytes: &[u8]) {
        assert_eq!(encode_len_to_vec(len), bytes, "unexpected usize encoding");
        assert_eq!(
            decode_shortu16_len(bytes).unwrap(),
            (usize::from(len), bytes.len()),
            "unexpected usize decoding"
        );
    }

    #[test]
    fn test_short_vec_encode_len() {
        assert_len_encoding(0x0, &[0x0]);
        assert_len_encoding(0x7f, &[0x7f]);
        assert_len_encoding(0x80, &[0x80, 0x01]);
        assert_len_encoding(0xff, &[0xff, 0x01]);
        assert_len_encoding(0x100, &[0x80, 0x02]);
        assert_len_encoding(0x7fff, &[0xff, 0xff, 0x01]);
        assert_len_encoding(0xffff, &[0xff, 0xff, 0x03]);
    }

    /// Encoded length grows by one byte per seven bits of the value.
    #[test]
    fn test_encoded_size_formula() {
        for (len, expected) in [
            (0usize, 1usize),
            (1, 1),
            (127, 1),
            (128, 2),
            (16383, 2),
            (16384, 3),
            (65535, 3),
            (1 << 21, 4),
            ((1 << 32) - 1, 5),
        ] {
            assert_eq!(encoded_len_size(len), expected);
            let mut buf = Vec::new();
            encode_len(&mut buf, len).unwrap();
            assert_eq!(buf.len(), expected);
        }
    }

    #[test]
    fn test_io_round_trip() {
        // Sample the full range the io helpers accept, not just u16.
        for len in [0usize, 1, 5, 127, 128, 16384, 65535, 65536, 1 << 20, u32::MAX as usize] {
            let mut buf = Vec::new();
            encode_len(&mut buf, len).unwrap();
            let mut cursor = Cursor::new(&buf[..]);
            assert_eq!(decode_len(&mut cursor).unwrap(), len);
            assert_eq!(cursor.position() as usize, buf.len());
        }
    }

    #[test]
    fn test_decode_len_runaway() {
        // Continuation bit never clears.
        let bytes = [0xffu8; 16];
        let mut cursor = Cursor::new(&bytes[..]);
        assert!(decode_len(&mut cursor).is_err());
    }

    #[test]
    fn test_decode_len_truncated() {
        let mut cursor = Cursor::new(&[0x80u8][..]);
        assert!(decode_len(&mut cursor).is_err());
    }

    fn assert_good_deserialized_value(value: u16, bytes: &[u8]) {
        assert_eq!(value, bincode::deserialize::<ShortU16>(bytes).unwrap().0);
    }

    fn assert_bad_deserialized_value(bytes: &[u8]) {
        assert!(
            bincode::deserialize::<ShortU16>(bytes).is_err(),
            "{bytes:?} should fail to deserialize"
        );
    }

    #[test]
    fn test_deserialize_shortu16() {
        assert_good_deserialized_value(0x0000, &[0x00]);
        assert_good_deserialized_value(0x007f, &[0x7f]);
        assert_good_deserialized_value(0x0080, &[0x80, 0x01]);
        assert_good_deserialized_value(0x00ff, &[0xff, 0x01]);
        assert_good_deserialized_value(0x4000, &[0x80, 0x80, 0x01]);
        assert_good_deserialized_value(0xffff, &[0xff, 0xff, 0x03]);

        // aliases
        // 0x0000
        assert_bad_deserialized_value(&[0x80, 0x00]);
        assert_bad_deserialized_value(&[0x80, 0x80, 0x00]);
        // 0x007f
        assert_bad_deserialized_value(&[0xff, 0x00]);
        assert_bad_deserialized_value(&[0xff, 0x80, 0x00]);
        // 0x0080 and 0x3fff
        assert_bad_deserialized_value(&[0x80, 0x81, 0x00]);
        assert_bad_deserialized_value(&[0xff, 0xff, 0x00]);

        // too short
        assert_bad_deserialized_value(&[]);
        assert_bad_deserialized_value(&[0x80]);

        // too long
        assert_bad_deserialized_value(&[0x80, 0x80, 0x80, 0x00]);

        // too large
        // 0x0001_0000
        assert_bad_deserialized_value(&[0x80, 0x80, 0x04]);
        // 0x0001_8000
        assert_bad_deserialized_value(&[0x80, 0x80, 0x06]);
    }

    #[test]
    fn test_short_vec_u8() {
        let vec = ShortVec(vec![4u8; 32]);
        let bytes = bincode::serialize(&vec).unwrap();
        assert_eq!(bytes.len(), vec.0.len() + 1);

        let vec1: ShortVec<u8> = bincode::deserialize(&bytes).unwrap();
        assert_eq!(vec, vec1);
    }

    #[test]
    fn test_short_vec_u8_too_long() {
        let vec = ShortVec(vec![4u8; usize::from(u16::MAX)]);
        assert_matches!(bincode::serialize(&vec), Ok(_));

        let vec = ShortVec(vec![4u8; usize::from(u16::MAX) + 1]);
        assert_matches!(bincode::serialize(&vec), Err(_));
    }

    #[test]
    fn test_short_vec_json() {
        let vec = ShortVec(vec![0u8, 1, 2]);
        let s = serde_json::to_string(&vec).unwrap();
        assert_eq!(s, "[[3],0,1,2]");
    }

    #[test]
    fn test_short_vec_aliased_length() {
        #[derive(Deserialize)]
        struct TestVec {
            #[serde(with = "crate")]
            vec: Vec<u8>,
        }

        let bytes: Vec<u8> = vec![
            0x81, 0x80, 0x00, // 3-byte alias of 1
            0x00,
        ];
        assert!(bincode::deserialize::<TestVec>(&bytes).is_err());
    }
}
