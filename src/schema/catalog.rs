//! Built-in transform catalog
//!
//! Registration order here is the catalog order used when a stable ordering
//! of transforms is needed (curriculum stages, domain listings).

use super::registry::{ParameterRange as P, TransformCategory as C, TransformSpec};

pub fn default_specs() -> Vec<TransformSpec> {
    vec![
        // Flips and rotations
        TransformSpec::new("HorizontalFlip", C::Flip),
        TransformSpec::new("VerticalFlip", C::Flip),
        TransformSpec::new("Rotate", C::Rotate).param(P::int("limit", -180, 180, 45)),
        TransformSpec::new("RandomRotate90", C::Rotate),
        // Color
        TransformSpec::new("RandomBrightnessContrast", C::Color)
            .param(P::float("brightness_limit", 0.0, 0.5, 0.2))
            .param(P::float("contrast_limit", 0.0, 0.5, 0.2)),
        TransformSpec::new("HueSaturationValue", C::Color)
            .param(P::int("hue_shift_limit", 0, 180, 20))
            .param(P::int("sat_shift_limit", 0, 100, 30))
            .param(P::int("val_shift_limit", 0, 100, 20)),
        TransformSpec::new("ColorJitter", C::Color)
            .param(P::float("brightness", 0.0, 1.0, 0.2))
            .param(P::float("contrast", 0.0, 1.0, 0.2))
            .param(P::float("saturation", 0.0, 1.0, 0.2))
            .param(P::float("hue", 0.0, 0.5, 0.1)),
        // Blur
        TransformSpec::new("GaussianBlur", C::Blur).param(P::int("blur_limit", 3, 15, 7)),
        TransformSpec::new("MotionBlur", C::Blur).param(P::int("blur_limit", 3, 15, 7)),
        // Noise
        TransformSpec::new("GaussNoise", C::Noise).param(P::float("var_limit", 0.0, 0.1, 0.02)),
        TransformSpec::new("ISONoise", C::Noise).param(P::float("intensity", 0.0, 1.0, 0.5)),
        // Geometric
        TransformSpec::new("ShiftScaleRotate", C::Geometric)
            .param(P::float("shift_limit", 0.0, 0.3, 0.1))
            .param(P::float("scale_limit", 0.0, 0.3, 0.1))
            .param(P::int("rotate_limit", 0, 180, 45)),
        TransformSpec::new("Affine", C::Geometric)
            .param(P::float("scale", 0.5, 1.5, 1.0))
            .param(P::int("rotate", -180, 180, 0))
            .param(P::int("shear", -30, 30, 0)),
        // Distortion
        TransformSpec::new("ElasticTransform", C::Distortion)
            .param(P::int("alpha", 1, 500, 120))
            .param(P::int("sigma", 1, 50, 12)),
        TransformSpec::new("GridDistortion", C::Distortion)
            .param(P::float("distort_limit", 0.0, 0.5, 0.3)),
        TransformSpec::new("OpticalDistortion", C::Distortion)
            .param(P::float("distort_limit", 0.0, 1.0, 0.5)),
        // Crop and scale
        TransformSpec::new("RandomCrop", C::Crop)
            .param(P::int("height", 32, 1024, 256))
            .param(P::int("width", 32, 1024, 256)),
        TransformSpec::new("CenterCrop", C::Crop)
            .param(P::int("height", 32, 1024, 256))
            .param(P::int("width", 32, 1024, 256)),
        TransformSpec::new("RandomScale", C::Scale).param(P::float("scale_limit", 0.0, 0.5, 0.1)),
        TransformSpec::new("Resize", C::Scale)
            .param(P::int("height", 32, 2048, 256))
            .param(P::int("width", 32, 2048, 256)),
        // Referenced by domain tables
        TransformSpec::new("CLAHE", C::Color).param(P::float("clip_limit", 1.0, 8.0, 4.0)),
        TransformSpec::new("Equalize", C::Color),
        TransformSpec::new("RGBShift", C::Color)
            .param(P::int("r_shift_limit", 0, 100, 20))
            .param(P::int("g_shift_limit", 0, 100, 20))
            .param(P::int("b_shift_limit", 0, 100, 20)),
        TransformSpec::new("ChannelShuffle", C::Color),
        TransformSpec::new("Posterize", C::Color).param(P::int("num_bits", 1, 8, 4)),
        TransformSpec::new("Solarize", C::Color).param(P::int("threshold", 0, 255, 128)),
        TransformSpec::new("ToGray", C::Color),
        TransformSpec::new("ToSepia", C::Color),
        TransformSpec::new("FancyPCA", C::Color).param(P::float("alpha", 0.0, 1.0, 0.1)),
        TransformSpec::new("Sharpen", C::Other)
            .param(P::float("alpha", 0.0, 1.0, 0.2))
            .param(P::float("lightness", 0.5, 2.0, 1.0)),
        TransformSpec::new("Perspective", C::Geometric).param(P::float("scale", 0.0, 0.2, 0.05)),
        TransformSpec::new("Defocus", C::Blur).param(P::int("radius", 1, 10, 3)),
        TransformSpec::new("ZoomBlur", C::Blur).param(P::float("max_factor", 1.0, 1.5, 1.1)),
        TransformSpec::new("MedianBlur", C::Blur).param(P::int("blur_limit", 3, 15, 7)),
        TransformSpec::new("Downscale", C::Scale).param(P::float("scale", 0.1, 1.0, 0.5)),
        TransformSpec::new("Morphological", C::Other).param(P::int("scale", 1, 10, 2)),
        TransformSpec::new("ImageCompression", C::Noise)
            .param(P::int("quality_lower", 1, 100, 80))
            .param(P::int("quality_upper", 1, 100, 100)),
        TransformSpec::new("CoarseDropout", C::Other)
            .param(P::int("max_holes", 1, 32, 8))
            .param(P::int("max_height", 1, 256, 8))
            .param(P::int("max_width", 1, 256, 8)),
        TransformSpec::new("Cutout", C::Other)
            .param(P::int("num_holes", 1, 32, 8))
            .param(P::int("max_h_size", 1, 256, 8))
            .param(P::int("max_w_size", 1, 256, 8)),
        TransformSpec::new("Superpixels", C::Other).param(P::float("p_replace", 0.0, 1.0, 0.1)),
        TransformSpec::new("Normalize", C::Other),
    ]
}
