//! 内置默认主题表
//!
//! 间距等刻度使用固定查表，不做 `n * 0.25rem` 之类的公式推导：
//! 不在表中的值（如 `p-13`）不会匹配。配置中的主题扩展项覆盖同名默认项。

use phf::phf_map;

/// 间距刻度
pub static SPACING: phf::Map<&'static str, &'static str> = phf_map! {
    "0" => "0px",
    "px" => "1px",
    "0.5" => "0.125rem",
    "1" => "0.25rem",
    "1.5" => "0.375rem",
    "2" => "0.5rem",
    "2.5" => "0.625rem",
    "3" => "0.75rem",
    "3.5" => "0.875rem",
    "4" => "1rem",
    "5" => "1.25rem",
    "6" => "1.5rem",
    "7" => "1.75rem",
    "8" => "2rem",
    "9" => "2.25rem",
    "10" => "2.5rem",
    "11" => "2.75rem",
    "12" => "3rem",
    "14" => "3.5rem",
    "16" => "4rem",
    "20" => "5rem",
    "24" => "6rem",
    "28" => "7rem",
    "32" => "8rem",
    "36" => "9rem",
    "40" => "10rem",
    "44" => "11rem",
    "48" => "12rem",
    "52" => "13rem",
    "56" => "14rem",
    "60" => "15rem",
    "64" => "16rem",
    "72" => "18rem",
    "80" => "20rem",
    "96" => "24rem",
};

/// 尺寸类（w / h / inset / basis …）在间距之外额外接受的分数和关键字
pub static SIZE_EXTRA: phf::Map<&'static str, &'static str> = phf_map! {
    "auto" => "auto",
    "full" => "100%",
    "min" => "min-content",
    "max" => "max-content",
    "fit" => "fit-content",
    "1/2" => "50%",
    "1/3" => "33.333333%",
    "2/3" => "66.666667%",
    "1/4" => "25%",
    "2/4" => "50%",
    "3/4" => "75%",
    "1/5" => "20%",
    "2/5" => "40%",
    "3/5" => "60%",
    "4/5" => "80%",
    "1/6" => "16.666667%",
    "5/6" => "83.333333%",
};

/// 响应式断点（min-width）
pub static SCREENS: phf::Map<&'static str, &'static str> = phf_map! {
    "sm" => "640px",
    "md" => "768px",
    "lg" => "1024px",
    "xl" => "1280px",
    "2xl" => "1536px",
};

/// 基础颜色；语义色来自配置
pub static COLORS: phf::Map<&'static str, &'static str> = phf_map! {
    "inherit" => "inherit",
    "current" => "currentColor",
    "transparent" => "transparent",
    "black" => "rgb(0 0 0)",
    "white" => "rgb(255 255 255)",
};

pub static FONT_SIZE: phf::Map<&'static str, &'static str> = phf_map! {
    "xs" => "0.75rem",
    "sm" => "0.875rem",
    "base" => "1rem",
    "lg" => "1.125rem",
    "xl" => "1.25rem",
    "2xl" => "1.5rem",
    "3xl" => "1.875rem",
    "4xl" => "2.25rem",
    "5xl" => "3rem",
    "6xl" => "3.75rem",
};

pub static FONT_WEIGHT: phf::Map<&'static str, &'static str> = phf_map! {
    "thin" => "100",
    "extralight" => "200",
    "light" => "300",
    "normal" => "400",
    "medium" => "500",
    "semibold" => "600",
    "bold" => "700",
    "extrabold" => "800",
    "black" => "900",
};

pub static OPACITY: phf::Map<&'static str, &'static str> = phf_map! {
    "0" => "0",
    "5" => "0.05",
    "10" => "0.1",
    "20" => "0.2",
    "25" => "0.25",
    "30" => "0.3",
    "40" => "0.4",
    "50" => "0.5",
    "60" => "0.6",
    "70" => "0.7",
    "75" => "0.75",
    "80" => "0.8",
    "90" => "0.9",
    "95" => "0.95",
    "100" => "1",
};

/// `rounded` 不带值时使用 `DEFAULT`
pub static RADIUS: phf::Map<&'static str, &'static str> = phf_map! {
    "none" => "0px",
    "sm" => "0.125rem",
    "DEFAULT" => "0.25rem",
    "md" => "0.375rem",
    "lg" => "0.5rem",
    "xl" => "0.75rem",
    "2xl" => "1rem",
    "3xl" => "1.5rem",
    "full" => "9999px",
};

pub static LINE_HEIGHT: phf::Map<&'static str, &'static str> = phf_map! {
    "none" => "1",
    "tight" => "1.25",
    "snug" => "1.375",
    "normal" => "1.5",
    "relaxed" => "1.625",
    "loose" => "2",
    "3" => ".75rem",
    "4" => "1rem",
    "5" => "1.25rem",
    "6" => "1.5rem",
    "7" => "1.75rem",
    "8" => "2rem",
    "9" => "2.25rem",
    "10" => "2.5rem",
};

pub static LETTER_SPACING: phf::Map<&'static str, &'static str> = phf_map! {
    "tighter" => "-0.05em",
    "tight" => "-0.025em",
    "normal" => "0em",
    "wide" => "0.025em",
    "wider" => "0.05em",
    "widest" => "0.1em",
};

pub static Z_INDEX: phf::Map<&'static str, &'static str> = phf_map! {
    "0" => "0",
    "10" => "10",
    "20" => "20",
    "30" => "30",
    "40" => "40",
    "50" => "50",
    "auto" => "auto",
};

pub static BORDER_WIDTH: phf::Map<&'static str, &'static str> = phf_map! {
    "DEFAULT" => "1px",
    "0" => "0px",
    "2" => "2px",
    "4" => "4px",
    "8" => "8px",
};

pub static SHADOW: phf::Map<&'static str, &'static str> = phf_map! {
    "sm" => "0 1px 2px 0 rgb(0 0 0 / 0.05)",
    "DEFAULT" => "0 1px 3px 0 rgb(0 0 0 / 0.1), 0 1px 2px -1px rgb(0 0 0 / 0.1)",
    "md" => "0 4px 6px -1px rgb(0 0 0 / 0.1), 0 2px 4px -2px rgb(0 0 0 / 0.1)",
    "lg" => "0 10px 15px -3px rgb(0 0 0 / 0.1), 0 4px 6px -4px rgb(0 0 0 / 0.1)",
    "xl" => "0 20px 25px -5px rgb(0 0 0 / 0.1), 0 8px 10px -6px rgb(0 0 0 / 0.1)",
    "none" => "0 0 #0000",
};

pub static DURATION: phf::Map<&'static str, &'static str> = phf_map! {
    "0" => "0s",
    "75" => "75ms",
    "100" => "100ms",
    "150" => "150ms",
    "200" => "200ms",
    "300" => "300ms",
    "500" => "500ms",
    "700" => "700ms",
    "1000" => "1000ms",
};

pub static MAX_WIDTH: phf::Map<&'static str, &'static str> = phf_map! {
    "none" => "none",
    "xs" => "20rem",
    "sm" => "24rem",
    "md" => "28rem",
    "lg" => "32rem",
    "xl" => "36rem",
    "2xl" => "42rem",
    "3xl" => "48rem",
    "4xl" => "56rem",
    "5xl" => "64rem",
    "6xl" => "72rem",
    "7xl" => "80rem",
    "full" => "100%",
    "prose" => "65ch",
};

/// `grid-cols-3` → `repeat(3, minmax(0, 1fr))`
pub static GRID_COLUMNS: phf::Map<&'static str, &'static str> = phf_map! {
    "1" => "repeat(1, minmax(0, 1fr))",
    "2" => "repeat(2, minmax(0, 1fr))",
    "3" => "repeat(3, minmax(0, 1fr))",
    "4" => "repeat(4, minmax(0, 1fr))",
    "5" => "repeat(5, minmax(0, 1fr))",
    "6" => "repeat(6, minmax(0, 1fr))",
    "12" => "repeat(12, minmax(0, 1fr))",
    "none" => "none",
};

/// `col-span-2` → `span 2 / span 2`
pub static GRID_SPAN: phf::Map<&'static str, &'static str> = phf_map! {
    "1" => "span 1 / span 1",
    "2" => "span 2 / span 2",
    "3" => "span 3 / span 3",
    "4" => "span 4 / span 4",
    "6" => "span 6 / span 6",
    "12" => "span 12 / span 12",
    "full" => "1 / -1",
};

pub static ANIMATION: phf::Map<&'static str, &'static str> = phf_map! {
    "none" => "none",
    "spin" => "spin 1s linear infinite",
    "ping" => "ping 1s cubic-bezier(0, 0, 0.2, 1) infinite",
    "pulse" => "pulse 2s cubic-bezier(0.4, 0, 0.6, 1) infinite",
    "bounce" => "bounce 1s infinite",
};

/// 内置动画的关键帧：name → [(step, [(property, value)])]
pub static KEYFRAMES: &[(&str, &[(&str, &[(&str, &str)])])] = &[
    ("spin", &[("to", &[("transform", "rotate(360deg)")])]),
    (
        "ping",
        &[("75%, 100%", &[("transform", "scale(2)"), ("opacity", "0")])],
    ),
    ("pulse", &[("50%", &[("opacity", ".5")])]),
    (
        "bounce",
        &[
            (
                "0%, 100%",
                &[
                    ("transform", "translateY(-25%)"),
                    ("animation-timing-function", "cubic-bezier(0.8,0,1,1)"),
                ],
            ),
            (
                "50%",
                &[
                    ("transform", "none"),
                    ("animation-timing-function", "cubic-bezier(0,0,0.2,1)"),
                ],
            ),
        ],
    ),
];
